//! Zero-order Sugeno rule base.
//!
//! The eight rules are plain data: an antecedent (a conjunction of terms,
//! each term either one set or a disjunction of sets) and a constant
//! consequent in milliseconds.  [`infer`] folds over the table once, so
//! adding a rule never needs new code.

use serde::Serialize;

use super::membership::{FuzzySet, Memberships};

/// One conjunct of a rule antecedent.
#[derive(Debug, Clone, Copy)]
pub enum Term {
    /// Degree of a single set.
    Is(FuzzySet),
    /// Fuzzy OR (max) over several sets.
    AnyOf(&'static [FuzzySet]),
}

impl Term {
    fn degree(&self, m: &Memberships) -> u8 {
        match self {
            Self::Is(set) => m.degree(*set),
            Self::AnyOf(sets) => sets.iter().map(|s| m.degree(*s)).max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyRule {
    /// 1-based identifier reported as the dominant rule.
    pub id: u8,
    /// Fuzzy AND (min) of these terms.
    pub antecedent: &'static [Term],
    /// Suggested watering time when this rule alone fires (ms).
    pub consequent_ms: u32,
    pub label: &'static str,
}

impl FuzzyRule {
    /// Firing strength: min over the antecedent terms.
    pub fn weight(&self, m: &Memberships) -> u8 {
        self.antecedent
            .iter()
            .map(|t| t.degree(m))
            .min()
            .unwrap_or(0)
    }
}

pub const RULE_COUNT: usize = 8;

use FuzzySet::{Comfortable, Cold, Dark, DryHigh, DryLow, DryMedium, Hot, Sunny};

const WARM: Term = Term::AnyOf(&[Hot, Comfortable]);

/// The rule base, in priority order for dominant-rule ties.
pub static RULES: [FuzzyRule; RULE_COUNT] = [
    FuzzyRule {
        id: 1,
        antecedent: &[Term::Is(DryHigh), Term::Is(Hot), Term::Is(Sunny)],
        consequent_ms: 20_000,
        label: "very dry, hot, sunny",
    },
    FuzzyRule {
        id: 2,
        antecedent: &[Term::Is(DryHigh), WARM],
        consequent_ms: 16_000,
        label: "very dry, warm",
    },
    FuzzyRule {
        id: 3,
        antecedent: &[Term::Is(DryMedium), Term::Is(Hot), Term::Is(Sunny)],
        consequent_ms: 12_000,
        label: "somewhat dry, hot, sunny",
    },
    FuzzyRule {
        id: 4,
        antecedent: &[Term::Is(DryMedium), WARM],
        consequent_ms: 8_000,
        label: "somewhat dry, warm",
    },
    FuzzyRule {
        id: 5,
        antecedent: &[Term::Is(DryLow)],
        consequent_ms: 0,
        label: "moist",
    },
    FuzzyRule {
        id: 6,
        antecedent: &[Term::Is(Cold), Term::Is(Dark)],
        consequent_ms: 0,
        label: "cold and dark",
    },
    FuzzyRule {
        id: 7,
        antecedent: &[Term::Is(DryHigh), Term::Is(Dark)],
        consequent_ms: 6_000,
        label: "very dry, dark",
    },
    FuzzyRule {
        id: 8,
        antecedent: &[Term::Is(DryMedium), Term::Is(Dark)],
        consequent_ms: 4_000,
        label: "somewhat dry, dark",
    },
];

/// Output of one inference pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DecisionResult {
    /// Firing strength of each rule, in table order.
    pub weights: [u8; RULE_COUNT],
    /// Id of the strongest rule, first wins ties; 0 when nothing fired.
    pub dominant_rule: u8,
    /// Weighted-average consequent, clamped to `0..=max_ms`.
    pub duration_ms: u32,
}

impl DecisionResult {
    /// Label of the dominant rule, `None` when nothing fired.
    pub fn dominant_label(&self) -> Option<&'static str> {
        rule(self.dominant_rule).map(|r| r.label)
    }
}

/// Evaluate the rule base and defuzzify by weighted average.
///
/// No rule firing is a normal outcome (duration 0, dominant rule 0).
pub fn infer(m: &Memberships, max_ms: u32) -> DecisionResult {
    let mut weights = [0u8; RULE_COUNT];
    let mut num: u64 = 0;
    let mut den: u64 = 0;
    let mut best_weight = 0u8;
    let mut dominant_rule = 0u8;

    for (slot, rule) in weights.iter_mut().zip(RULES.iter()) {
        let w = rule.weight(m);
        *slot = w;
        num += u64::from(w) * u64::from(rule.consequent_ms);
        den += u64::from(w);
        if w > best_weight {
            best_weight = w;
            dominant_rule = rule.id;
        }
    }

    let duration_ms = match num.checked_div(den) {
        Some(avg) => avg.min(u64::from(max_ms)) as u32,
        None => 0,
    };

    DecisionResult {
        weights,
        dominant_rule,
        duration_ms,
    }
}

/// Look up a rule by its 1-based id.
pub fn rule(id: u8) -> Option<&'static FuzzyRule> {
    RULES.iter().find(|r| r.id == id)
}
