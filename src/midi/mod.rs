// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI wire model and transport abstraction.
//!
//! This module provides the typed message specs bound to controls, plus a
//! trait-based seam over the MIDI transport so that the engine can run
//! against `midir` in production and a mock backend in tests.

pub mod midir_backend;
pub mod session;
pub mod spec;

use std::fmt;
use std::sync::mpsc::Sender;

use crate::error::PortError;

pub use midir_backend::{print_ports, MidirBackend};
pub use session::{PortSelection, PortSession};
pub use spec::{MessageKind, MessageSpec, RawMessage, DEFAULT_VALUE};

/// Direction of a MIDI port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// A raw message as delivered by the transport callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Transport timestamp in microseconds (driver-specific epoch)
    pub timestamp_us: u64,
    /// Raw MIDI bytes
    pub bytes: RawMessage,
}

impl InboundMessage {
    pub fn new(timestamp_us: u64, bytes: impl Into<RawMessage>) -> Self {
        Self {
            timestamp_us,
            bytes: bytes.into(),
        }
    }
}

/// Trait for MIDI output implementations.
///
/// This trait abstracts over different MIDI backends, providing a unified
/// interface for sending raw MIDI messages.
pub trait MidiOutput {
    /// Send a MIDI message immediately.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes (e.g., `[0x90, 60, 127]` for Note On)
    fn send(&mut self, message: &[u8]) -> Result<(), PortError>;

    /// Release the underlying transport handle.
    fn close(self: Box<Self>) {}
}

/// An open input connection. Dropping or closing it stops the callback.
pub trait InputConnection {
    fn close(self: Box<Self>) {}
}

/// Trait for the MIDI transport: port enumeration and connection by name.
///
/// Inbound messages are pushed into `sink` from the transport's own thread.
/// Implementations must never block in that callback.
pub trait MidiBackend {
    /// Names of the ports currently available in `direction`
    fn port_names(&self, direction: Direction) -> Result<Vec<String>, PortError>;

    /// Connect to the input port called `name`
    fn connect_input(
        &mut self,
        name: &str,
        sink: Sender<InboundMessage>,
    ) -> Result<Box<dyn InputConnection>, PortError>;

    /// Connect to the output port called `name`
    fn connect_output(&mut self, name: &str) -> Result<Box<dyn MidiOutput>, PortError>;
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;

    /// Mask selecting the message type from a status byte
    pub const TYPE_MASK: u8 = 0xF0;
    /// Mask for 7-bit data bytes
    pub const DATA_MASK: u8 = 0x7F;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Input.to_string(), "input");
        assert_eq!(Direction::Output.to_string(), "output");
    }

    #[test]
    fn test_inbound_message_crosses_threads_in_order() {
        let (tx, rx) = mpsc::channel();
        let producer = thread::spawn(move || {
            for (i, status) in [messages::NOTE_ON, messages::CONTROL_CHANGE].iter().enumerate() {
                tx.send(InboundMessage::new(i as u64 * 1000, vec![*status, 1, 2]))
                    .unwrap();
            }
        });
        producer.join().unwrap();

        let received: Vec<InboundMessage> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                InboundMessage::new(0, [0x90, 1, 2]),
                InboundMessage::new(1000, [0xB0, 1, 2]),
            ]
        );
    }
}
