//! Fuzzy decision pipeline: memberships in, advisory watering time out.
//!
//! The suggested duration is reported for observability only.  Pump
//! switching is decided by the hysteresis FSM on the raw percentages.

pub mod membership;
pub mod rules;

pub use membership::{FuzzyInputs, FuzzySet, Memberships, DEGREE_MAX};
pub use rules::{infer, DecisionResult, FuzzyRule, RULES};

use crate::config::MembershipConfig;

/// Membership evaluation followed by inference, in one call.
pub fn decide(inputs: &FuzzyInputs, cfg: &MembershipConfig, max_ms: u32) -> DecisionResult {
    infer(&Memberships::evaluate(inputs, cfg), max_ms)
}
