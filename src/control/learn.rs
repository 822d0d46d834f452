// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI learn state machine.
//!
//! ```text
//! Idle --select--> Listening --inbound--> Captured --confirm--> Idle
//!                      |                      |
//!                      +-------cancel---------+--> Idle
//! ```
//!
//! Only one session exists at a time and the first selection wins. The
//! first decodable message while listening is captured; later traffic is
//! ignored until the session is confirmed or cancelled.

use tracing::{debug, info};

use super::ControlId;
use crate::midi::{MessageSpec, RawMessage};

/// Where the learn session is
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LearnState {
    #[default]
    Idle,
    /// Waiting for the next inbound message for `target`
    Listening { target: ControlId },
    /// A message arrived and awaits confirmation
    Captured {
        target: ControlId,
        spec: MessageSpec,
        raw: RawMessage,
    },
}

impl LearnState {
    /// The control being learned, if any
    pub fn target(&self) -> Option<ControlId> {
        match self {
            LearnState::Idle => None,
            LearnState::Listening { target } | LearnState::Captured { target, .. } => {
                Some(*target)
            }
        }
    }
}

/// Result of a confirmed session, to be written into the binding table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnOutcome {
    pub target: ControlId,
    pub spec: MessageSpec,
    pub raw: RawMessage,
}

/// Owner of the single learn session
#[derive(Debug, Default)]
pub struct LearnController {
    /// Learn mode toggle: presses select a control instead of triggering it
    armed: bool,
    state: LearnState,
}

impl LearnController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn learn mode on
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Turn learn mode off, cancelling any session. Returns true if a
    /// session was cancelled.
    pub fn disarm(&mut self) -> bool {
        let cancelled = self.cancel();
        self.armed = false;
        cancelled
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn state(&self) -> &LearnState {
        &self.state
    }

    /// Whether a session is live (listening or captured)
    pub fn is_active(&self) -> bool {
        self.state != LearnState::Idle
    }

    /// Start listening for `target`. No-op if a session is already live.
    pub fn select(&mut self, target: ControlId) -> bool {
        if self.is_active() {
            debug!("Learn session already active, ignoring selection");
            return false;
        }
        self.state = LearnState::Listening { target };
        info!("Learning input for control {}", target.index());
        true
    }

    /// Offer an inbound message to the session. Returns true if it was
    /// captured.
    pub fn capture(&mut self, raw: &[u8]) -> bool {
        let LearnState::Listening { target } = self.state else {
            return false;
        };
        let Some(spec) = MessageSpec::decode(raw) else {
            return false;
        };

        debug!("Captured {} for control {}", spec, target.index());
        self.state = LearnState::Captured {
            target,
            spec,
            raw: raw.to_vec(),
        };
        true
    }

    /// Finish a captured session. Does nothing while still listening.
    pub fn confirm(&mut self) -> Option<LearnOutcome> {
        if !matches!(self.state, LearnState::Captured { .. }) {
            return None;
        }
        match std::mem::take(&mut self.state) {
            LearnState::Captured { target, spec, raw } => {
                self.armed = false;
                info!("Learned {} for control {}", spec, target.index());
                Some(LearnOutcome { target, spec, raw })
            }
            _ => None,
        }
    }

    /// Abandon the session without touching the control. Returns true if a
    /// session was live.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = LearnState::Idle;
        self.armed = false;
        if was_active {
            info!("Learn session cancelled");
        }
        was_active
    }

    /// Interaction outside the learn surface cancels the session
    pub fn outside_interaction(&mut self) -> bool {
        self.is_active() && self.cancel()
    }
}
