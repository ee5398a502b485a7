//! Command inbox between producer tasks and the control loop.
//!
//! Uses an `embassy-sync` bounded channel so an HTTP or console task can
//! queue commands while the synchronous control loop owns all state.  The
//! loop drains the inbox at the top of each cycle, so calibration and pump
//! state are only ever mutated on the control thread.
//!
//! ```text
//! ┌──────────────┐  AppCommand  ┌──────────────┐
//! │ Producer(s)  │────────────▶│ Control Loop │
//! └──────────────┘              └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use super::commands::AppCommand;

/// Maximum queued commands.
pub const INBOX_DEPTH: usize = 8;

pub struct CommandInbox {
    channel: Channel<CriticalSectionRawMutex, AppCommand, INBOX_DEPTH>,
}

impl CommandInbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue a command.  Hands it back if the inbox is full.
    pub fn submit(&self, cmd: AppCommand) -> Result<(), AppCommand> {
        self.channel.try_send(cmd).map_err(|e| match e {
            embassy_sync::channel::TrySendError::Full(cmd) => cmd,
        })
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<AppCommand, INBOX_DEPTH> {
        let mut out = Vec::new();
        // Commands queued while draining wait for the next cycle.
        while !out.is_full() {
            let Ok(cmd) = self.channel.try_receive() else {
                break;
            };
            let _ = out.push(cmd);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for CommandInbox {
    fn default() -> Self {
        Self::new()
    }
}
