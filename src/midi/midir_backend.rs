// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cross-platform MIDI backend built on `midir`.
//!
//! Ports are addressed by their display name so that a name stored in a
//! config record can be reopened after a restart.

use std::sync::mpsc::Sender;

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput as MidirOutput, MidiOutputConnection};
use tracing::{debug, info, warn};

use super::{Direction, InboundMessage, InputConnection, MidiBackend, MidiOutput};
use crate::error::PortError;

/// `midir` implementation of the transport seam
pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    /// Create a backend that registers with the system under `client_name`
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    fn input_client(&self) -> Result<MidiInput, PortError> {
        let mut midi_in = MidiInput::new(&self.client_name)?;
        midi_in.ignore(Ignore::None);
        Ok(midi_in)
    }
}

impl MidiBackend for MidirBackend {
    fn port_names(&self, direction: Direction) -> Result<Vec<String>, PortError> {
        let names = match direction {
            Direction::Input => {
                let midi_in = self.input_client()?;
                midi_in
                    .ports()
                    .iter()
                    .filter_map(|port| midi_in.port_name(port).ok())
                    .collect()
            }
            Direction::Output => {
                let midi_out = MidirOutput::new(&self.client_name)?;
                midi_out
                    .ports()
                    .iter()
                    .filter_map(|port| midi_out.port_name(port).ok())
                    .collect()
            }
        };
        Ok(names)
    }

    fn connect_input(
        &mut self,
        name: &str,
        sink: Sender<InboundMessage>,
    ) -> Result<Box<dyn InputConnection>, PortError> {
        let midi_in = self.input_client()?;
        let port = midi_in
            .ports()
            .into_iter()
            .find(|port| midi_in.port_name(port).map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| PortError::PortNotFound {
                direction: Direction::Input,
                name: name.to_string(),
            })?;

        let connection_name = format!("{} Input", self.client_name);
        let connection = midi_in
            .connect(
                &port,
                &connection_name,
                move |timestamp, message, _| {
                    // Receiver gone means the session is shutting down
                    let _ = sink.send(InboundMessage::new(timestamp, message));
                },
                (),
            )
            .map_err(|e| PortError::Transport(format!("connect {name}: {e}")))?;

        info!("Connected MIDI input '{}'", name);
        Ok(Box::new(MidirInputConnection {
            name: name.to_string(),
            connection,
        }))
    }

    fn connect_output(&mut self, name: &str) -> Result<Box<dyn MidiOutput>, PortError> {
        let midi_out = MidirOutput::new(&self.client_name)?;
        let port = midi_out
            .ports()
            .into_iter()
            .find(|port| midi_out.port_name(port).map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| PortError::PortNotFound {
                direction: Direction::Output,
                name: name.to_string(),
            })?;

        let connection_name = format!("{} Output", self.client_name);
        let connection = midi_out
            .connect(&port, &connection_name)
            .map_err(|e| PortError::Transport(format!("connect {name}: {e}")))?;

        info!("Connected MIDI output '{}'", name);
        Ok(Box::new(MidirOutputConnection {
            name: name.to_string(),
            connection,
        }))
    }
}

struct MidirInputConnection {
    name: String,
    connection: MidiInputConnection<()>,
}

impl InputConnection for MidirInputConnection {
    fn close(self: Box<Self>) {
        debug!("Closing MIDI input '{}'", self.name);
        self.connection.close();
    }
}

struct MidirOutputConnection {
    name: String,
    connection: MidiOutputConnection,
}

impl MidiOutput for MidirOutputConnection {
    fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
        self.connection.send(message).map_err(|e| {
            warn!("Send to '{}' failed: {}", self.name, e);
            PortError::from(e)
        })
    }

    fn close(self: Box<Self>) {
        debug!("Closing MIDI output '{}'", self.name);
        self.connection.close();
    }
}

/// Print all available MIDI ports in `direction` to stdout
pub fn print_ports(backend: &dyn MidiBackend, direction: Direction) -> Result<(), PortError> {
    let names = backend.port_names(direction)?;
    if names.is_empty() {
        println!("No MIDI {} ports found.", direction);
    } else {
        println!("Available MIDI {} ports:", direction);
        for (i, name) in names.iter().enumerate() {
            println!("  {}: {}", i, name);
        }
    }
    Ok(())
}
