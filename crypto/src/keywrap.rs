//! # Key Management Algorithms
//!
//! The `alg` strategies a JWE can name ([RFC7518] §4): direct use of a
//! shared symmetric key, AES Key Wrap, RSA encryption, ECDH-ES key
//! agreement (direct and with wrapping), and PBES2 password-based
//! wrapping.
//!
//! A key management algorithm owns the content encryption key's
//! lifecycle on both sides: producing or deriving a fresh CEK (and adding
//! any algorithm-specific header entries — `epk`, `p2s`, `p2c` — while the
//! header is still being built), wrapping it for the wire, and unwrapping
//! it again during decryption.
//!
//! All `try_*` operations share one failure shape: `Ok(None)` covers an
//! undersized destination and, for unwrapping, any authentication or
//! padding failure — deliberately indistinguishable so a decryption
//! oracle cannot be built from the error surface.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

mod aeskw;
mod dir;
mod ecdh;
mod pbes2;
mod rsa;

pub use self::aeskw::{A128Kw, A192Kw, A256Kw};
pub use self::dir::Dir;
pub use self::ecdh::{EcdhEs, EcdhEsA128Kw, EcdhEsA256Kw};
pub use self::pbes2::{Pbes2Hs256A128Kw, Pbes2Hs384A192Kw, Pbes2Hs512A256Kw};
pub use self::rsa::{Rsa15, RsaOaep, RsaOaep256};

use std::ops::RangeInclusive;

use crate::alg::Algorithm;
use crate::error::Result;
use crate::header_map::HeaderMap;
use crate::key::SecretKey;

/// A content-encryption-key wrap/derive strategy.
pub trait KeyManagementAlgorithm: Algorithm {
    /// Legal CEK sizes in bytes for a KEK of the given bit length.
    fn legal_cek_len(&self, kek_bits: u32) -> Vec<RangeInclusive<usize>>;

    /// Size in bytes of the encrypted CEK this algorithm emits for the
    /// given KEK and CEK sizes. Zero for direct modes.
    fn encrypted_cek_len(&self, kek_bits: u32, cek_len: usize) -> usize;

    /// Fill `cek` with a fresh random or derived content encryption key,
    /// adding algorithm-specific entries to `header` where the wire format
    /// requires them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::KeyValidation`] for a KEK of the wrong
    /// shape and [`crate::Error::ParameterSize`] for an illegal CEK size.
    fn new_cek(&self, kek: &SecretKey, header: &mut HeaderMap, cek: &mut [u8]) -> Result<()>;

    /// Wrap `cek` into `dest`, returning the number of bytes written or
    /// `Ok(None)` (with neither `dest` nor `header` modified) when `dest`
    /// is smaller than [`encrypted_cek_len`](Self::encrypted_cek_len).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::KeyValidation`] for a KEK of the wrong
    /// shape, [`crate::Error::ParameterSize`] for an illegal CEK size, and
    /// [`crate::Error::Configuration`] for algorithms that cannot
    /// transport a caller-chosen CEK.
    fn try_wrap(
        &self, kek: &SecretKey, header: &mut HeaderMap, cek: &[u8], dest: &mut [u8],
    ) -> Result<Option<usize>>;

    /// Generate a fresh CEK and wrap it in one call.
    ///
    /// # Errors
    ///
    /// As for [`new_cek`](Self::new_cek) and [`try_wrap`](Self::try_wrap).
    fn try_wrap_new(
        &self, kek: &SecretKey, header: &mut HeaderMap, cek: &mut [u8], dest: &mut [u8],
    ) -> Result<Option<usize>> {
        self.new_cek(kek, header, cek)?;
        self.try_wrap(kek, header, cek, dest)
    }

    /// Reverse [`try_wrap`](Self::try_wrap): recover the CEK from its
    /// wire form into `dest`.
    ///
    /// Returns `Ok(None)` when `dest` is undersized **or** the wrapped
    /// key fails authentication/padding checks — the two are deliberately
    /// indistinguishable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::KeyValidation`] for a KEK of the wrong
    /// shape and [`crate::Error::Format`] when required header entries
    /// (`epk`, `p2s`, `p2c`) are missing or malformed.
    fn try_unwrap(
        &self, kek: &SecretKey, header: &HeaderMap, wrapped: &[u8], dest: &mut [u8],
    ) -> Result<Option<usize>>;
}
