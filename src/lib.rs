// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! padmap - a MIDI pad mapper.
//!
//! Eight named controls, each with an input binding that triggers it from
//! inbound MIDI and an output binding it sends when triggered. Bindings can
//! be learned from live input and are kept in JSON records on disk.

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod midi;

pub use config::{ConfigRecord, ConfigStore, RecordId, Settings};
pub use control::{BindingTable, Control, ControlId, LearnState, CONTROL_COUNT};
pub use engine::{ConfigLabel, Engine, EngineEvent, ShutdownChoice, ShutdownOutcome};
pub use error::{EngineError, Result};
pub use midi::{Direction, MessageKind, MessageSpec, MidiBackend, MidirBackend};
