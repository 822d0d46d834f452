// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Notifications from the engine to the presentation layer.

use std::path::PathBuf;

use crate::config::RecordId;
use crate::control::{Control, ControlId, LearnState};
use crate::midi::Direction;

/// Text shown for the current record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLabel {
    /// File name of the record being worked on
    pub name: String,
    /// Edits not yet saved to a named record
    pub is_unsaved: bool,
    pub is_default: bool,
}

impl ConfigLabel {
    pub fn new(record: &RecordId, dirty: bool) -> Self {
        Self {
            name: record.to_string(),
            is_unsaved: dirty || *record == RecordId::Scratch,
            is_default: *record == RecordId::Default,
        }
    }
}

impl std::fmt::Display for ConfigLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if self.is_unsaved {
            write!(f, " (Unsaved)")
        } else if self.is_default {
            write!(f, " (Default)")
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Learn mode toggled or the session moved
    LearnStateChanged { armed: bool, state: LearnState },
    /// A control was renamed or rebound
    BindingChanged { id: ControlId, control: Control },
    ConfigLabelChanged(ConfigLabel),
    /// A control fired, from a press or a matching inbound message
    TriggerFired { id: ControlId, name: String },
    /// A write-through save failed; the edit is kept in memory
    PersistFailed(String),
    /// A port named by a loaded record could not be opened. It stays
    /// selected and is saved with the record.
    PortUnavailable {
        direction: Direction,
        name: String,
        reason: String,
    },
}

/// What to do with unsaved edits at shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownChoice {
    /// Save to the given path, or to the current named record
    Save(Option<PathBuf>),
    Discard,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Safe to exit
    Exit,
    /// The user cancelled; keep running
    Abort,
    /// Saving needs a path from the user first
    NeedsPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_label_text() {
        assert_eq!(
            ConfigLabel::new(&RecordId::Default, false).to_string(),
            "default_config.json (Default)"
        );
        assert_eq!(
            ConfigLabel::new(&RecordId::Scratch, false).to_string(),
            "temp_config.json (Unsaved)"
        );
        let named = RecordId::Named(PathBuf::from("/sets/live.json"));
        assert_eq!(ConfigLabel::new(&named, false).to_string(), "live.json");
        assert_eq!(ConfigLabel::new(&named, true).to_string(), "live.json (Unsaved)");
    }
}
