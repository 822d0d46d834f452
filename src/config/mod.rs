// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration records for padmap.
//!
//! This module provides the JSON record holding all eight bindings plus the
//! port selection, the store that manages the default, scratch and named
//! records on disk, and the TOML application settings.

pub mod settings;
pub mod store;

pub use settings::Settings;
pub use store::{ConfigStore, RecordId};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::control::{Control, CONTROL_COUNT};
use crate::error::ConfigError;
use crate::midi::{MessageKind, MessageSpec, PortSelection, RawMessage, DEFAULT_VALUE};

/// All bindings in presentation order plus the chosen ports
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigRecord {
    pub bindings: Vec<Control>,
    pub ports: PortSelection,
}

/// One `buttons` entry as it is written to disk
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ButtonEntry {
    pub input_type: String,
    pub input_number: Option<i64>,
    /// Value of a learned CC input
    pub input_value: Option<i64>,
    pub output_type: String,
    pub output_number: Option<i64>,
    pub output_value: Option<i64>,
    /// Raw message from the last learn
    pub midi_message: Option<Vec<i64>>,
}

/// 0-127, anything else is treated as unset
fn data_byte(n: i64) -> Option<u8> {
    u8::try_from(n).ok().filter(|b| *b <= 127)
}

/// An integer field. Whole-number floats such as `60.0` count as integers.
fn int_field(entry: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = entry.get(key)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn kind_field(entry: &Map<String, Value>, key: &str) -> MessageKind {
    entry
        .get(key)
        .and_then(Value::as_str)
        .and_then(MessageKind::from_name)
        .unwrap_or_default()
}

fn spec_field(entry: &Map<String, Value>, prefix: &str) -> MessageSpec {
    MessageSpec {
        kind: kind_field(entry, &format!("{prefix}_type")),
        number: int_field(entry, &format!("{prefix}_number")).and_then(data_byte),
        value: int_field(entry, &format!("{prefix}_value"))
            .and_then(data_byte)
            .unwrap_or(DEFAULT_VALUE),
    }
}

/// The raw learned message, kept only if every byte fits in a byte
fn message_field(entry: &Map<String, Value>) -> Option<RawMessage> {
    entry
        .get("midi_message")?
        .as_array()?
        .iter()
        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}

/// Read one entry field by field. Bad fields fall back on their own; only
/// an entry that is not an object at all resets the whole control.
fn control_from_entry(name: &str, entry: &Value) -> Control {
    let Value::Object(entry) = entry else {
        warn!("Unreadable entry for '{}', resetting it", name);
        return Control::new(name);
    };
    Control {
        name: name.to_string(),
        input: spec_field(entry, "input"),
        output: spec_field(entry, "output"),
        last_message: message_field(entry),
    }
}

impl ButtonEntry {
    fn from_control(control: &Control) -> Self {
        Self {
            input_type: control.input.kind.name().to_string(),
            input_number: control.input.number.map(i64::from),
            input_value: Some(i64::from(control.input.value)),
            output_type: control.output.kind.name().to_string(),
            output_number: control.output.number.map(i64::from),
            output_value: Some(i64::from(control.output.value)),
            midi_message: control
                .last_message
                .as_ref()
                .map(|m| m.iter().map(|b| i64::from(*b)).collect()),
        }
    }
}

impl ConfigRecord {
    /// Eight unbound controls named "Button 1" to "Button 8", no ports
    pub fn bootstrap() -> Self {
        Self {
            bindings: (0..CONTROL_COUNT)
                .map(|i| Control::new(Control::default_name(i)))
                .collect(),
            ports: PortSelection::default(),
        }
    }

    /// Load a record from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_json(&contents).map_err(|reason| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a record from JSON.
    ///
    /// Only a document that is not a JSON object is rejected. Inside it,
    /// each bad field falls back to an unset number, the default value or
    /// the note type, and an entry that is not an object becomes an unbound
    /// control.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let root: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let Value::Object(root) = root else {
            return Err("top level is not an object".to_string());
        };

        let mut bindings = Vec::new();
        if let Some(Value::Object(buttons)) = root.get("buttons") {
            for (name, entry) in buttons.iter().take(CONTROL_COUNT) {
                bindings.push(control_from_entry(name, entry));
            }
            if buttons.len() > CONTROL_COUNT {
                debug!("Ignoring {} entries past the eighth", buttons.len() - CONTROL_COUNT);
            }
        }

        let ports = match root.get("midi_ports") {
            Some(Value::Object(ports)) => PortSelection {
                input: ports.get("input").and_then(Value::as_str).map(str::to_string),
                output: ports.get("output").and_then(Value::as_str).map(str::to_string),
            },
            _ => PortSelection::default(),
        };

        Ok(Self { bindings, ports })
    }

    /// Serialize to pretty JSON. Object key order is presentation order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buttons = Map::new();
        for control in &self.bindings {
            buttons.insert(
                control.name.clone(),
                serde_json::to_value(ButtonEntry::from_control(control))?,
            );
        }

        let mut root = Map::new();
        root.insert("buttons".to_string(), Value::Object(buttons));
        root.insert("midi_ports".to_string(), serde_json::to_value(&self.ports)?);
        serde_json::to_string_pretty(&Value::Object(root))
    }

    /// Save to `path`, replacing any previous file in one step.
    ///
    /// The record is written to a sibling temp file and renamed over the
    /// target, so a reader never sees a partial file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = self.to_json().map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let temp_path = temp_path_for(path);
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&temp_path, path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_err(e));
        }

        debug!("Saved config record {:?}", path);
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "config".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> ConfigRecord {
        let mut record = ConfigRecord::bootstrap();
        record.bindings[0].name = "Kick".to_string();
        record.bindings[0].input = MessageSpec::note(36);
        record.bindings[0].output = MessageSpec::note(60);
        record.bindings[1].input = MessageSpec::cc(20, 64);
        record.bindings[1].output = MessageSpec::cc(7, 100);
        record.bindings[1].last_message = Some(vec![0xB0, 20, 64]);
        record.bindings[2].output = MessageSpec::program(4);
        record.ports = PortSelection {
            input: Some("nanoPAD2".to_string()),
            output: None,
        };
        record
    }

    #[test]
    fn test_parse_legacy_format() {
        let json = r#"{
    "buttons": {
        "Kick": {"input_type": "note", "input_number": 36, "output_type": "cc",
                 "output_number": 7, "output_value": 90, "midi_message": [144, 36, 100]},
        "Snare": {"input_type": "pc", "input_number": null, "output_type": "note",
                  "output_number": null, "output_value": 127, "midi_message": null}
    },
    "midi_ports": {"input": "Pads", "output": null}
}"#;
        let record = ConfigRecord::from_json(json).unwrap();
        assert_eq!(record.bindings.len(), 2);
        assert_eq!(record.bindings[0].name, "Kick");
        assert_eq!(record.bindings[0].input, MessageSpec::note(36));
        assert_eq!(record.bindings[0].output, MessageSpec::cc(7, 90));
        assert_eq!(record.bindings[0].last_message, Some(vec![144, 36, 100]));
        assert_eq!(record.bindings[1].name, "Snare");
        assert_eq!(record.bindings[1].input, MessageSpec::unset(MessageKind::ProgramChange));
        assert_eq!(record.ports.input.as_deref(), Some("Pads"));
        assert_eq!(record.ports.output, None);
    }

    #[test]
    fn test_out_of_range_fields_are_clamped() {
        let json = r#"{"buttons": {
            "A": {"input_type": "cc", "input_number": 300, "output_type": "weird",
                  "output_number": -1, "output_value": 999, "midi_message": [1, 2, 700]}
        }}"#;
        let record = ConfigRecord::from_json(json).unwrap();
        let a = &record.bindings[0];
        assert_eq!(a.input, MessageSpec::unset(MessageKind::ControlChange));
        assert_eq!(a.output, MessageSpec::unset(MessageKind::Note));
        assert_eq!(a.output.value, 127);
        assert_eq!(a.last_message, None);
        assert_eq!(record.ports, PortSelection::default());
    }

    #[test]
    fn test_non_object_entry_resets_control() {
        let json = r#"{"buttons": {"A": [36], "B": 5}}"#;
        let record = ConfigRecord::from_json(json).unwrap();
        assert_eq!(record.bindings, vec![Control::new("A"), Control::new("B")]);
    }

    #[test]
    fn test_bad_field_keeps_other_fields() {
        let json = r#"{"buttons": {
            "Float": {"input_number": 60.0, "output_type": "cc", "output_number": 7,
                      "output_value": 90},
            "NullType": {"input_type": null, "input_number": 40, "output_type": "pc",
                         "output_number": 3},
            "Word": {"input_type": "cc", "input_number": "sixty", "output_number": 12.5,
                     "midi_message": [176, 1, 2]}
        }}"#;
        let record = ConfigRecord::from_json(json).unwrap();

        assert_eq!(record.bindings[0].input, MessageSpec::note(60));
        assert_eq!(record.bindings[0].output, MessageSpec::cc(7, 90));

        assert_eq!(record.bindings[1].input, MessageSpec::note(40));
        assert_eq!(record.bindings[1].output, MessageSpec::program(3));

        let word = &record.bindings[2];
        assert_eq!(word.input, MessageSpec::unset(MessageKind::ControlChange));
        assert_eq!(word.output, MessageSpec::default());
        assert_eq!(word.last_message, Some(vec![176, 1, 2]));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(ConfigRecord::from_json("not json").is_err());
        assert!(ConfigRecord::from_json("[1, 2, 3]").is_err());
        assert_eq!(ConfigRecord::from_json("{}").unwrap(), ConfigRecord::default());
    }

    #[test]
    fn test_key_order_is_presentation_order() {
        let mut record = ConfigRecord::bootstrap();
        record.bindings[0].name = "Zeta".to_string();
        record.bindings[1].name = "Alpha".to_string();

        let json = record.to_json().unwrap();
        assert!(json.find("Zeta").unwrap() < json.find("Alpha").unwrap());
        let parsed = ConfigRecord::from_json(&json).unwrap();
        assert_eq!(parsed.bindings[0].name, "Zeta");
        assert_eq!(parsed.bindings[1].name, "Alpha");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("live.json");
        let record = sample();

        record.save(&path).unwrap();
        assert_eq!(ConfigRecord::load(&path).unwrap(), record);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = ConfigRecord::load(dir.path().join("nope.json"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ \"buttons\": ").unwrap();
        assert!(matches!(ConfigRecord::load(&path), Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_failed_save_leaves_prior_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.json");
        sample().save(&path).unwrap();

        // A directory in place of the temp file makes the write fail
        fs::create_dir(temp_path_for(&path)).unwrap();
        let result = ConfigRecord::bootstrap().save(&path);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
        assert_eq!(ConfigRecord::load(&path).unwrap(), sample());
    }
}
