//! # Content Encryption Algorithms
//!
//! The `enc` strategies a JWE can name ([RFC7518] §5): AES-GCM, the
//! AES-CBC + HMAC composites, and XChaCha20-Poly1305. Every algorithm
//! fixes its CEK, nonce, and tag sizes and derives ciphertext size from
//! plaintext size (equal for stream-like modes, next block boundary for
//! CBC).
//!
//! `encrypt` validates every parameter size — naming the offending
//! argument — before writing a single byte. `try_decrypt` is the
//! deliberate opposite: an undersized destination and an authentication
//! failure are the same `None`, so nothing about the failure mode leaks;
//! callers wanting a sized error must pre-validate with
//! [`max_plaintext_len`](ContentEncryptionAlgorithm::max_plaintext_len).
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

mod cbc_hmac;
mod chacha;
mod gcm;

pub use self::cbc_hmac::{A128CbcHs256, A192CbcHs384, A256CbcHs512};
pub use self::chacha::XC20P;
pub use self::gcm::{A128Gcm, A192Gcm, A256Gcm};

use crate::alg::Algorithm;
use crate::error::{Error, Result};

/// An authenticated encryption (AEAD) strategy.
pub trait ContentEncryptionAlgorithm: Algorithm {
    /// Content encryption key size in bytes.
    fn cek_len(&self) -> usize;

    /// Nonce (initialization vector) size in bytes.
    fn nonce_len(&self) -> usize;

    /// Authentication tag size in bytes.
    fn tag_len(&self) -> usize;

    /// Ciphertext size for a plaintext of the given size.
    fn ciphertext_len(&self, plaintext_len: usize) -> usize;

    /// Largest plaintext a ciphertext of the given size can decrypt to.
    fn max_plaintext_len(&self, ciphertext_len: usize) -> usize;

    /// Encrypt `plaintext` with `cek` and `nonce`, authenticating
    /// `aad` alongside, writing into `ciphertext` and `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterSize`] naming the first argument whose
    /// size does not match the algorithm's fixed or derived sizes; no
    /// bytes are written on failure.
    fn encrypt(
        &self, cek: &[u8], nonce: &[u8], plaintext: &[u8], aad: &[u8], ciphertext: &mut [u8],
        tag: &mut [u8],
    ) -> Result<()>;

    /// Decrypt `ciphertext` into `plaintext`, returning the number of
    /// bytes written.
    ///
    /// `Ok(None)` covers an undersized destination **and** an
    /// authentication failure; the two are indistinguishable by design,
    /// and no partial plaintext survives either. `Err` is reserved for
    /// CEK/nonce sizes the caller got wrong.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterSize`] for a CEK or nonce of the wrong
    /// size.
    fn try_decrypt(
        &self, cek: &[u8], nonce: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8],
        plaintext: &mut [u8],
    ) -> Result<Option<usize>>;
}

// shared parameter validation, applied before any cryptographic work
fn check_size(name: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::ParameterSize { name, expected, actual });
    }
    Ok(())
}
