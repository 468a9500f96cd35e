//! # Algorithm Identity
//!
//! Every cryptographic strategy the engine can run is an immutable,
//! stateless object identified by its family and wire code (the `alg`,
//! `enc`, or `zip` value it answers to). Two instances with the same
//! `(family, code)` pair are interchangeable; the registry relies on that
//! to hand out shared instances.

use std::fmt::{self, Display};

/// The four independent strategy families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Digital signatures and MACs (`alg` on a JWS).
    Signature,

    /// Content-encryption-key wrapping, derivation, or direct use
    /// (`alg` on a JWE).
    KeyManagement,

    /// Authenticated encryption with associated data (`enc`).
    ContentEncryption,

    /// Payload compression (`zip`).
    Compression,
}

impl Display for AlgorithmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => write!(f, "signature"),
            Self::KeyManagement => write!(f, "key management"),
            Self::ContentEncryption => write!(f, "content encryption"),
            Self::Compression => write!(f, "compression"),
        }
    }
}

/// Base trait shared by all algorithm strategies.
///
/// Implementations must be stateless after construction so a single
/// instance can serve unrestricted concurrent callers.
pub trait Algorithm: Send + Sync {
    /// The family this algorithm belongs to.
    fn family(&self) -> AlgorithmFamily;

    /// The wire identifier, e.g. `"RS256"`, `"A128GCM"`, `"DEF"`.
    fn code(&self) -> &'static str;
}
