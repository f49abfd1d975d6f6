// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

// Mapping errors

#[macro_export]
/// Build a topology [PdpError] from a message that supports `to_string`
macro_rules! topology_error {
    ($msg:expr) => {
        Err($crate::types::PdpError::Topology($msg.to_string()))
    };
}

#[macro_export]
/// Build an encoding [PdpError] from a message that supports `to_string`
macro_rules! encoding_error {
    ($msg:expr) => {
        Err($crate::types::PdpError::Encoding($msg.to_string()))
    };
}

#[macro_export]
/// Build an accounting [PdpError] from a message that supports `to_string`
macro_rules! accounting_error {
    ($msg:expr) => {
        Err($crate::types::PdpError::Accounting($msg.to_string()))
    };
}

#[macro_export]
/// Build a runtime data [PdpError] from a message that supports `to_string`
macro_rules! data_error {
    ($msg:expr) => {
        Err($crate::types::PdpError::Data($msg.to_string()))
    };
}

#[macro_export]
/// Build a configuration [PdpError] from a message that supports `to_string`
macro_rules! config_error {
    ($msg:expr) => {
        Err($crate::types::PdpError::Config($msg.to_string()))
    };
}

/// Every failure is fatal: a mapping either produces a complete set of node
/// images or returns one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum PdpError {
    /// Malformed group adjacency or partitioning.
    Topology(String),
    /// A value cannot be represented in its binary field.
    Encoding(String),
    /// Declared and written region sizes disagree.
    Accounting(String),
    /// Recorded data could not be read back.
    Data(String),
    /// Input files are unreadable or malformed.
    Config(String),
}

impl PdpError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            PdpError::Topology(msg)
            | PdpError::Encoding(msg)
            | PdpError::Accounting(msg)
            | PdpError::Data(msg)
            | PdpError::Config(msg) => msg,
        }
    }
}

impl fmt::Display for PdpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PdpError::Topology(msg) => write!(f, "Topology error: {msg}"),
            PdpError::Encoding(msg) => write!(f, "Encoding error: {msg}"),
            PdpError::Accounting(msg) => write!(f, "Accounting error: {msg}"),
            PdpError::Data(msg) => write!(f, "Data error: {msg}"),
            PdpError::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl Error for PdpError {}

/// The PdpResult is the return type for most mapping functions
pub type PdpResult<T = ()> = Result<T, PdpError>;
