//! # Error Taxonomy
//!
//! Every failure the engine can signal maps onto one of a small set of
//! stable kinds so callers can match on the category without parsing
//! message text. Operations that write into a caller-supplied buffer do
//! not error when the buffer is undersized; they return `Ok(None)` so the
//! caller can re-size and retry.

use thiserror::Error;

/// Result type for all engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error kinds.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed input: bad base64url, wrong segment count, invalid header
    /// JSON, or corrupt compressed data. Never retried.
    #[error("malformed input: {0}")]
    Format(String),

    /// A caller-supplied buffer, key, or nonce does not match the
    /// algorithm's fixed or derived size. Names the offending parameter.
    #[error("invalid size for `{name}`: expected {expected} bytes, got {actual}")]
    ParameterSize {
        /// The parameter that failed validation.
        name: &'static str,
        /// The size the algorithm requires.
        expected: usize,
        /// The size the caller supplied.
        actual: usize,
    },

    /// The header or credentials name an algorithm code absent from the
    /// registry.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signature mismatch or AEAD authentication failure. Deliberately
    /// carries no detail about which stage failed.
    #[error("verification failed")]
    Verification,

    /// Duplicate registry registration, missing credentials, or another
    /// caller-side wiring problem.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Key material failed validation: wrong variant for the requested
    /// operation or a bit length outside the algorithm's legal sizes.
    #[error("key validation failed: {0}")]
    KeyValidation(String),
}

impl Error {
    /// Shorthand for a [`Error::Format`] with a formatted message.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Shorthand for a [`Error::Configuration`] with a formatted message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for a [`Error::KeyValidation`] with a formatted message.
    pub fn key_validation(msg: impl Into<String>) -> Self {
        Self::KeyValidation(msg.into())
    }
}
