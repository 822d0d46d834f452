// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the mapping engine.
//!
//! Nothing in here is fatal. Binding errors leave the table untouched,
//! config and port errors degrade to defaults, and send failures are dropped.

use std::path::PathBuf;

use thiserror::Error;

use crate::midi::Direction;

/// A message spec field outside the 7-bit MIDI data range
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidSpec {
    #[error("number {0} is outside 0-127")]
    Number(u8),

    #[error("value {0} is outside 0-127")]
    Value(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("no control named '{0}'")]
    NotFound(String),

    #[error("name '{0}' is already used by another control")]
    NameConflict(String),

    #[error("control names must not be empty")]
    InvalidName,

    #[error("invalid message spec: {0}")]
    InvalidSpec(#[from] InvalidSpec),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config record not found: {0:?}")]
    NotFound(PathBuf),

    #[error("malformed config record {path:?}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no named record to save to")]
    NoSaveTarget,

    #[error("invalid settings: {0}")]
    Settings(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("MIDI {direction} port '{name}' not found")]
    PortNotFound { direction: Direction, name: String },

    #[error("MIDI transport error: {0}")]
    Transport(String),

    #[error("MIDI output port is closed")]
    PortClosed,
}

impl From<midir::InitError> for PortError {
    fn from(e: midir::InitError) -> Self {
        PortError::Transport(e.to_string())
    }
}

impl From<midir::SendError> for PortError {
    fn from(e: midir::SendError) -> Self {
        PortError::Transport(e.to_string())
    }
}

impl From<midir::PortInfoError> for PortError {
    fn from(e: midir::PortInfoError) -> Self {
        PortError::Transport(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Port(#[from] PortError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
