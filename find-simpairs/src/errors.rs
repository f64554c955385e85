//! Error definitions.
use std::{io, result};

use lsh::LshError;

/// A specialized Result type for this library.
pub type Result<T, E = FindSimpairsError> = result::Result<T, E>;

/// Errors in this library.
#[derive(Debug, thiserror::Error)]
pub enum FindSimpairsError {
    /// A parameter is missing, out of range, or inconsistent with another one.
    /// Reported before any hashing work begins.
    #[error("ConfigError: {0}")]
    Config(String),

    /// An input document is malformed.
    #[error("InputError: {0}")]
    Input(String),

    /// The shingle source could not be read or reset.
    #[error("IoError: {0}")]
    Io(#[from] io::Error),

    /// Contains [`LshError`].
    #[error(transparent)]
    Lsh(#[from] LshError),
}

impl FindSimpairsError {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn input<S: Into<String>>(msg: S) -> Self {
        Self::Input(msg.into())
    }
}
