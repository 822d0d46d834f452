// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The eight user-nameable controls and everything that acts on them.
//!
//! This module provides:
//! - The binding table (names, input and output specs, presentation order)
//! - The MIDI learn state machine
//! - The dispatcher matching inbound messages and encoding triggers

pub mod bindings;
pub mod dispatch;
pub mod learn;

pub use bindings::BindingTable;
pub use dispatch::{DispatchStats, Dispatcher, Routed};
pub use learn::{LearnController, LearnOutcome, LearnState};

use crate::midi::{MessageSpec, RawMessage};

/// Number of controls. They exist for the whole session and are never
/// created or destroyed, only renamed and rebound.
pub const CONTROL_COUNT: usize = 8;

/// Stable identity of a control: its slot in presentation order.
///
/// Renaming never changes a control's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(usize);

impl ControlId {
    /// All ids in presentation order
    pub fn all() -> impl Iterator<Item = ControlId> {
        (0..CONTROL_COUNT).map(ControlId)
    }

    /// Id for slot `index`, if it exists
    pub fn from_index(index: usize) -> Option<Self> {
        (index < CONTROL_COUNT).then_some(ControlId(index))
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// One control with its bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    /// User-visible name, unique among the eight
    pub name: String,
    /// What inbound message triggers this control
    pub input: MessageSpec,
    /// What this control sends when triggered
    pub output: MessageSpec,
    /// Raw message captured by the last confirmed learn
    pub last_message: Option<RawMessage>,
}

impl Control {
    /// An unbound control
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: MessageSpec::default(),
            output: MessageSpec::default(),
            last_message: None,
        }
    }

    /// Name given to slot `index` in a fresh configuration
    pub fn default_name(index: usize) -> String {
        format!("Button {}", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_ids() {
        let ids: Vec<_> = ControlId::all().map(|id| id.index()).collect();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
        assert_eq!(ControlId::from_index(7).map(|id| id.index()), Some(7));
        assert_eq!(ControlId::from_index(8), None);
    }

    #[test]
    fn test_new_control_is_unbound() {
        let control = Control::new(Control::default_name(0));
        assert_eq!(control.name, "Button 1");
        assert!(!control.input.is_set());
        assert!(!control.output.is_set());
        assert_eq!(control.output.value, 127);
        assert_eq!(control.last_message, None);
    }
}
