// src/gate/signal.rs

//! Per-boundary signal state machines.

use std::time::Instant;

/// State of one polled boundary check.
///
/// Starts `Unknown` until the first poll result arrives; after that it only
/// toggles between `Allowed` and `Blocked` with the latest message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalState {
    Unknown,
    Allowed { message: String },
    Blocked { message: String },
}

/// One boundary signal, updated last-value-wins by timestamped observations.
#[derive(Debug, Clone)]
pub struct BoundarySignal {
    state: SignalState,
    updated_at: Option<Instant>,
}

impl Default for BoundarySignal {
    fn default() -> Self {
        Self {
            state: SignalState::Unknown,
            updated_at: None,
        }
    }
}

impl BoundarySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a poll result. Later observations simply overwrite earlier
    /// ones; polls carry no version token.
    pub fn observe(&mut self, allowed: bool, message: String, at: Instant) {
        self.state = if allowed {
            SignalState::Allowed { message }
        } else {
            SignalState::Blocked { message }
        };
        self.updated_at = Some(at);
    }

    pub fn state(&self) -> &SignalState {
        &self.state
    }

    pub fn updated_at(&self) -> Option<Instant> {
        self.updated_at
    }

    /// Whether this signal currently permits progression. `Unknown` does not
    /// refuse anything.
    pub fn allows(&self) -> bool {
        !matches!(self.state, SignalState::Blocked { .. })
    }

    /// The blocking message, when blocked with a non-empty message.
    pub fn blocking_message(&self) -> Option<&str> {
        match &self.state {
            SignalState::Blocked { message } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
