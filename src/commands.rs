//! Discrete command codes and the single injection path into the mode
//! machine.
//!
//! Human input and scenario playback share one queue on purpose: the
//! controller consumes commands without knowing their origin. This mirrors
//! the source system's single command channel and is a deliberate
//! simplification, not an accident.

use heapless::Deque;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_QUEUED_COMMANDS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    SwitchToAuto,
    SwitchToManual,
    SetManualDuty(u8),
    Reset,
}

impl Command {
    /// Parse a raw command code as typed at the CLI.
    ///
    /// Recognized codes: `auto`, `manual`, `duty:<pct>`, `reset`. Anything
    /// else is reported as [`CommandError::Unrecognized`]; nothing is ever
    /// raised.
    pub fn parse(code: &str) -> Result<Self, CommandError> {
        match code {
            "auto" => Ok(Command::SwitchToAuto),
            "manual" => Ok(Command::SwitchToManual),
            "reset" => Ok(Command::Reset),
            other => {
                if let Some(duty) = other.strip_prefix("duty:") {
                    duty.parse::<u8>()
                        .map(Command::SetManualDuty)
                        .map_err(|_| CommandError::Unrecognized(other.to_string()))
                } else {
                    Err(CommandError::Unrecognized(other.to_string()))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Every command is refused while the safety override is latched.
    #[error("rejected: safety override active")]
    SafetyLockout,
    #[error("manual duty requires manual mode")]
    NotInManualMode,
    #[error("duty {0}% is not a supported step")]
    InvalidDutyStep(u8),
    #[error("command queue full")]
    QueueFull,
    #[error("unrecognized command code `{0}`")]
    Unrecognized(String),
}

/// Bounded FIFO between command producers and the simulation driver.
pub struct CommandQueue {
    queue: Deque<Command, MAX_QUEUED_COMMANDS>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self { queue: Deque::new() }
    }

    pub fn emit(&mut self, command: Command) -> Result<(), CommandError> {
        self.queue
            .push_back(command)
            .map_err(|_| CommandError::QueueFull)
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
