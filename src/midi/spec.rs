// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Typed MIDI message specs.
//!
//! A `MessageSpec` describes what a control listens for or emits: a message
//! kind, an optional number (note, controller or program), and a value that
//! only matters for control changes. The channel nibble is never looked at.

use std::fmt;

use super::messages;
use crate::error::InvalidSpec;

/// Raw MIDI bytes
pub type RawMessage = Vec<u8>;

/// Value used for unset or non-CC specs, and the Note On velocity we emit
pub const DEFAULT_VALUE: u8 = 127;

const DATA_MAX: u8 = 127;

/// Kind of MIDI message a control can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageKind {
    /// Note On (Note Off is never bound)
    #[default]
    Note,
    /// Control Change (CC)
    ControlChange,
    /// Program Change
    ProgramChange,
}

impl MessageKind {
    /// Short name used in config records
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::Note => "note",
            MessageKind::ControlChange => "cc",
            MessageKind::ProgramChange => "pc",
        }
    }

    /// Parse a config record type name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "note" => Some(MessageKind::Note),
            "cc" => Some(MessageKind::ControlChange),
            "pc" => Some(MessageKind::ProgramChange),
            _ => None,
        }
    }

    /// Classify a status byte, ignoring the channel nibble
    pub fn from_status(status: u8) -> Option<Self> {
        match status & messages::TYPE_MASK {
            messages::NOTE_ON => Some(MessageKind::Note),
            messages::CONTROL_CHANGE => Some(MessageKind::ControlChange),
            messages::PROGRAM_CHANGE => Some(MessageKind::ProgramChange),
            _ => None,
        }
    }
}

/// What a control listens for, or what it sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageSpec {
    pub kind: MessageKind,
    /// Note, controller or program number. `None` until configured.
    pub number: Option<u8>,
    /// Only meaningful for control changes, kept for every kind
    pub value: u8,
}

impl Default for MessageSpec {
    fn default() -> Self {
        Self {
            kind: MessageKind::Note,
            number: None,
            value: DEFAULT_VALUE,
        }
    }
}

impl MessageSpec {
    /// An unconfigured spec of the given kind
    pub fn unset(kind: MessageKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Create a note spec
    pub fn note(note: u8) -> Self {
        Self {
            kind: MessageKind::Note,
            number: Some(note),
            value: DEFAULT_VALUE,
        }
    }

    /// Create a CC spec
    pub fn cc(controller: u8, value: u8) -> Self {
        Self {
            kind: MessageKind::ControlChange,
            number: Some(controller),
            value,
        }
    }

    /// Create a program change spec
    pub fn program(program: u8) -> Self {
        Self {
            kind: MessageKind::ProgramChange,
            number: Some(program),
            value: DEFAULT_VALUE,
        }
    }

    pub fn is_set(&self) -> bool {
        self.number.is_some()
    }

    /// Check that number and value fit in a MIDI data byte
    pub fn validate(&self) -> Result<(), InvalidSpec> {
        if let Some(number) = self.number {
            if number > DATA_MAX {
                return Err(InvalidSpec::Number(number));
            }
        }
        if self.value > DATA_MAX {
            return Err(InvalidSpec::Value(self.value));
        }
        Ok(())
    }

    /// Out-of-range number becomes unset, out-of-range value becomes the default
    pub fn clamped(self) -> Self {
        Self {
            kind: self.kind,
            number: self.number.filter(|n| *n <= DATA_MAX),
            value: if self.value <= DATA_MAX {
                self.value
            } else {
                DEFAULT_VALUE
            },
        }
    }

    /// Check if an inbound spec triggers this one. Unset specs match nothing.
    pub fn matches(&self, inbound: &MessageSpec) -> bool {
        self.number.is_some() && self.kind == inbound.kind && self.number == inbound.number
    }

    /// Decode raw MIDI bytes into a spec.
    ///
    /// Returns `None` for messages shorter than two bytes and for every
    /// message type other than Note On, CC and Program Change.
    pub fn decode(raw: &[u8]) -> Option<Self> {
        if raw.len() < 2 {
            return None;
        }

        let kind = MessageKind::from_status(raw[0])?;
        let number = raw[1] & messages::DATA_MASK;
        let value = match kind {
            MessageKind::ControlChange => raw
                .get(2)
                .map(|v| v & messages::DATA_MASK)
                .unwrap_or(DEFAULT_VALUE),
            _ => DEFAULT_VALUE,
        };

        Some(Self {
            kind,
            number: Some(number),
            value,
        })
    }

    /// Encode this spec as the raw messages a trigger sends.
    ///
    /// Notes are a momentary pulse (Note On at full velocity, then Note Off).
    /// Returns an empty list when the number is unset.
    pub fn encode(&self) -> Vec<RawMessage> {
        let Some(number) = self.number else {
            return Vec::new();
        };
        let number = number & messages::DATA_MASK;

        match self.kind {
            MessageKind::Note => vec![
                vec![messages::NOTE_ON, number, DEFAULT_VALUE],
                vec![messages::NOTE_OFF, number, 0],
            ],
            MessageKind::ControlChange => vec![vec![
                messages::CONTROL_CHANGE,
                number,
                self.value & messages::DATA_MASK,
            ]],
            MessageKind::ProgramChange => vec![vec![messages::PROGRAM_CHANGE, number]],
        }
    }
}

impl fmt::Display for MessageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(number) = self.number else {
            return write!(f, "{} --", self.kind.name().to_uppercase());
        };

        match self.kind {
            MessageKind::Note => {
                let note_names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
                let octave = (number / 12) as i8 - 1;
                let name = note_names[(number % 12) as usize];
                write!(f, "Note {}{} ({})", name, octave, number)
            }
            MessageKind::ControlChange => write!(f, "CC {} = {}", number, self.value),
            MessageKind::ProgramChange => write!(f, "PC {}", number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_note_on_any_channel() {
        assert_eq!(MessageSpec::decode(&[0x90, 60, 100]), Some(MessageSpec::note(60)));
        assert_eq!(MessageSpec::decode(&[0x9F, 60, 1]), Some(MessageSpec::note(60)));
    }

    #[test]
    fn test_decode_control_change_keeps_value() {
        let spec = MessageSpec::decode(&[0xB3, 7, 64]).unwrap();
        assert_eq!(spec, MessageSpec::cc(7, 64));
    }

    #[test]
    fn test_decode_program_change_two_bytes() {
        assert_eq!(MessageSpec::decode(&[0xC0, 5]), Some(MessageSpec::program(5)));
    }

    #[test]
    fn test_decode_ignores_unmodelled_messages() {
        assert_eq!(MessageSpec::decode(&[0x80, 60, 0]), None); // Note Off
        assert_eq!(MessageSpec::decode(&[0xE0, 0x00, 0x40]), None); // Pitch bend
        assert_eq!(MessageSpec::decode(&[0xF8]), None); // Clock
        assert_eq!(MessageSpec::decode(&[0x90]), None);
        assert_eq!(MessageSpec::decode(&[]), None);
    }

    #[test]
    fn test_encode_note_is_pulse() {
        let out = MessageSpec::note(64).encode();
        assert_eq!(out, vec![vec![0x90, 64, 127], vec![0x80, 64, 0]]);
    }

    #[test]
    fn test_encode_cc_and_program() {
        assert_eq!(MessageSpec::cc(10, 42).encode(), vec![vec![0xB0, 10, 42]]);
        assert_eq!(MessageSpec::program(3).encode(), vec![vec![0xC0, 3]]);
    }

    #[test]
    fn test_encode_unset_is_empty() {
        assert!(MessageSpec::unset(MessageKind::ControlChange).encode().is_empty());
    }

    #[test]
    fn test_encode_decode_preserves_kind_and_number() {
        for kind in [MessageKind::Note, MessageKind::ControlChange, MessageKind::ProgramChange] {
            for number in [0u8, 1, 60, 127] {
                let spec = MessageSpec {
                    kind,
                    number: Some(number),
                    value: 99,
                };
                let encoded = spec.encode();
                let decoded = MessageSpec::decode(&encoded[0]).unwrap();
                assert_eq!(decoded.kind, kind);
                assert_eq!(decoded.number, Some(number));
                if kind == MessageKind::ControlChange {
                    assert_eq!(decoded.value, 99);
                }
            }
        }
    }

    #[test]
    fn test_validate_ranges() {
        assert!(MessageSpec::note(127).validate().is_ok());
        assert_eq!(MessageSpec::note(128).validate(), Err(InvalidSpec::Number(128)));
        assert_eq!(MessageSpec::cc(1, 200).validate(), Err(InvalidSpec::Value(200)));
        assert!(MessageSpec::default().validate().is_ok());
    }

    #[test]
    fn test_clamped() {
        let spec = MessageSpec {
            kind: MessageKind::ControlChange,
            number: Some(130),
            value: 255,
        };
        assert_eq!(spec.clamped(), MessageSpec::unset(MessageKind::ControlChange));
        assert_eq!(MessageSpec::cc(4, 5).clamped(), MessageSpec::cc(4, 5));
    }

    #[test]
    fn test_matches_ignores_value_and_unset() {
        let bound = MessageSpec::cc(10, 127);
        assert!(bound.matches(&MessageSpec::cc(10, 0)));
        assert!(!bound.matches(&MessageSpec::note(10)));
        assert!(!MessageSpec::default().matches(&MessageSpec::default()));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MessageKind::from_name("CC"), Some(MessageKind::ControlChange));
        assert_eq!(MessageKind::from_name("pc"), Some(MessageKind::ProgramChange));
        assert_eq!(MessageKind::from_name("sysex"), None);
        assert_eq!(MessageKind::Note.name(), "note");
    }

    #[test]
    fn test_display() {
        assert_eq!(MessageSpec::note(60).to_string(), "Note C4 (60)");
        assert_eq!(MessageSpec::cc(7, 100).to_string(), "CC 7 = 100");
        assert_eq!(MessageSpec::program(2).to_string(), "PC 2");
        assert_eq!(MessageSpec::default().to_string(), "NOTE --");
    }
}
