//! Forwarding loop state machine.
//!
//! # State Transitions
//! ```text
//! Idle → Connecting → AwaitingReady → Forwarding → Draining → Stopped
//!            │               │                         ▲
//!            └───────────────┴── interrupt ────────────┘
//! ```
//!
//! Every path to Stopped passes through Draining.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwarderState {
    Idle,
    Connecting,
    AwaitingReady,
    Forwarding,
    Draining,
    Stopped,
}

impl ForwarderState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: ForwarderState) -> bool {
        use ForwarderState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, AwaitingReady)
                | (Connecting, Draining)
                | (AwaitingReady, Forwarding)
                | (AwaitingReady, Draining)
                | (Forwarding, Draining)
                | (Draining, Stopped)
        )
    }
}

impl fmt::Display for ForwarderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForwarderState::Idle => "idle",
            ForwarderState::Connecting => "connecting",
            ForwarderState::AwaitingReady => "awaiting_ready",
            ForwarderState::Forwarding => "forwarding",
            ForwarderState::Draining => "draining",
            ForwarderState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Why the forwarding loop left its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The source reached end of input.
    EndOfInput,
    /// Shutdown was requested.
    Interrupted,
    /// Reading the source failed.
    SourceFailed,
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cause = match self {
            StopCause::EndOfInput => "end of input",
            StopCause::Interrupted => "interrupted",
            StopCause::SourceFailed => "input read failure",
        };
        f.write_str(cause)
    }
}
