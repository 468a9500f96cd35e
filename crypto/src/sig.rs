//! # Digital Signature Algorithms
//!
//! The `alg` strategies a JWS can name ([RFC7518] §3): HMAC keyed hashes,
//! RSA (PKCS#1 v1.5 and PSS), ECDSA over P-256 and secp256k1, and EdDSA.
//!
//! Keyed-hash verification is implemented by resigning and comparing —
//! never a separate verify primitive — with a length check followed by a
//! full-length constant-time comparison.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

mod ecdsa;
mod eddsa;
mod hmac;
mod rsa;

pub use self::ecdsa::{Es256, Es256K};
pub use self::eddsa::EdDsa;
pub use self::hmac::{Hs256, Hs384, Hs512};
pub use self::rsa::{Ps256, Rs256, Rs384, Rs512};

use crate::alg::Algorithm;
use crate::error::Result;
use crate::key::SecretKey;

/// A digital signature or MAC strategy.
pub trait SignatureAlgorithm: Algorithm {
    /// Exact signature size in bytes for a key of the given bit length.
    fn signature_len(&self, key_bits: u32) -> usize;

    /// Sign `input` into `dest`.
    ///
    /// Returns the number of bytes written — always
    /// [`signature_len`](Self::signature_len) — or `Ok(None)` (nothing
    /// written) when `dest` is smaller than that.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::KeyValidation`] when the key has the wrong
    /// shape or an illegal size for this algorithm.
    fn try_sign(&self, key: &SecretKey, input: &[u8], dest: &mut [u8]) -> Result<Option<usize>>;

    /// Verify `signature` over `input`.
    ///
    /// `Ok(false)` for any mismatch, including a signature of the wrong
    /// length; the caller learns nothing about which check failed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::KeyValidation`] when the key has the wrong
    /// shape for this algorithm.
    fn verify(&self, key: &SecretKey, input: &[u8], signature: &[u8]) -> Result<bool>;
}
