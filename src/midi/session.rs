// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Open port handles for the running session.
//!
//! At most one input and one output are open at a time. Reopening a
//! direction always closes the previous handle first.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Direction, InboundMessage, InputConnection, MidiBackend, MidiOutput};
use crate::error::PortError;

/// Port names chosen by the user, as stored in config records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSelection {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

impl PortSelection {
    pub fn get(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Input => self.input.as_deref(),
            Direction::Output => self.output.as_deref(),
        }
    }
}

struct OpenInput {
    name: String,
    connection: Box<dyn InputConnection>,
}

struct OpenOutput {
    name: String,
    connection: Box<dyn MidiOutput>,
}

/// The currently open input and output handles, plus the port names the
/// user has chosen.
///
/// A chosen name outlives its handle: a port named in a loaded record stays
/// selected while it is unplugged, so saving the record keeps it.
pub struct PortSession {
    backend: Box<dyn MidiBackend>,
    sink: Sender<InboundMessage>,
    input: Option<OpenInput>,
    output: Option<OpenOutput>,
    selected: PortSelection,
}

impl PortSession {
    /// Create a session with nothing open. Inbound traffic from any input
    /// opened later is pushed into `sink`.
    pub fn new(backend: Box<dyn MidiBackend>, sink: Sender<InboundMessage>) -> Self {
        Self {
            backend,
            sink,
            input: None,
            output: None,
            selected: PortSelection::default(),
        }
    }

    /// Names of the ports the transport currently offers
    pub fn available(&self, direction: Direction) -> Result<Vec<String>, PortError> {
        self.backend.port_names(direction)
    }

    /// Open the port called `name`, closing whatever was open in that direction.
    ///
    /// On failure the direction is left closed and no name is recorded.
    pub fn open(&mut self, direction: Direction, name: &str) -> Result<(), PortError> {
        self.close(direction);
        self.connect(direction, name)?;
        *self.selected_mut(direction) = Some(name.to_string());
        Ok(())
    }

    fn connect(&mut self, direction: Direction, name: &str) -> Result<(), PortError> {
        match direction {
            Direction::Input => {
                let connection = self.backend.connect_input(name, self.sink.clone())?;
                self.input = Some(OpenInput {
                    name: name.to_string(),
                    connection,
                });
            }
            Direction::Output => {
                let connection = self.backend.connect_output(name)?;
                self.output = Some(OpenOutput {
                    name: name.to_string(),
                    connection,
                });
            }
        }

        info!("Opened MIDI {} '{}'", direction, name);
        Ok(())
    }

    /// Close the handle for `direction`, if any, and forget its name
    pub fn close(&mut self, direction: Direction) {
        self.release(direction);
        *self.selected_mut(direction) = None;
    }

    fn release(&mut self, direction: Direction) {
        match direction {
            Direction::Input => {
                if let Some(open) = self.input.take() {
                    debug!("Closed MIDI input '{}'", open.name);
                    open.connection.close();
                }
            }
            Direction::Output => {
                if let Some(open) = self.output.take() {
                    debug!("Closed MIDI output '{}'", open.name);
                    open.connection.close();
                }
            }
        }
    }

    fn selected_mut(&mut self, direction: Direction) -> &mut Option<String> {
        match direction {
            Direction::Input => &mut self.selected.input,
            Direction::Output => &mut self.selected.output,
        }
    }

    pub fn is_open(&self, direction: Direction) -> bool {
        self.port_name(direction).is_some()
    }

    /// Name of the open port in `direction`
    pub fn port_name(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Input => self.input.as_ref().map(|o| o.name.as_str()),
            Direction::Output => self.output.as_ref().map(|o| o.name.as_str()),
        }
    }

    /// The chosen port names, for persistence. Includes names taken from a
    /// record whose port is currently missing.
    pub fn selection(&self) -> PortSelection {
        self.selected.clone()
    }

    /// Reopen the ports named in `selection`. Directions without a name are
    /// closed. A port that no longer exists is left closed but stays
    /// selected, and its error is returned with its direction.
    pub fn apply_selection(&mut self, selection: &PortSelection) -> Vec<(Direction, PortError)> {
        let mut errors = Vec::new();
        for direction in [Direction::Input, Direction::Output] {
            match selection.get(direction) {
                Some(name) => {
                    self.release(direction);
                    if let Err(e) = self.connect(direction, name) {
                        warn!("Could not reopen MIDI {} '{}': {}", direction, name, e);
                        errors.push((direction, e));
                    }
                    *self.selected_mut(direction) = Some(name.to_string());
                }
                None => self.close(direction),
            }
        }
        errors
    }

    /// Send raw bytes on the output port. Nothing is queued or retried.
    pub fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
        let output = self.output.as_mut().ok_or(PortError::PortClosed)?;
        output.connection.send(message)
    }
}

impl Drop for PortSession {
    fn drop(&mut self) {
        self.release(Direction::Input);
        self.release(Direction::Output);
    }
}
