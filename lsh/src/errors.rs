//! Error definitions.
use std::result;

/// A specialized Result type for this library.
pub type Result<T, E = LshError> = result::Result<T, E>;

/// Errors in this library.
#[derive(Debug, thiserror::Error)]
pub enum LshError {
    /// An input argument is invalid or inconsistent with another one.
    #[error("InputError: {0}")]
    Input(String),

    /// A shingle id lies outside the domain the hash table was built for.
    #[error("OutOfDomain: shingle id {id} is not in [0, {num_values})")]
    OutOfDomain {
        /// The offending shingle id.
        id: u32,
        /// Size of the domain covered by the hash table.
        num_values: usize,
    },
}

impl LshError {
    pub(crate) fn input<S: Into<String>>(msg: S) -> Self {
        Self::Input(msg.into())
    }
}
