//! Direct use of a shared symmetric key (`dir`).
//!
//! The KEK *is* the CEK; the encrypted-key segment is the empty octet
//! sequence ([RFC7518] §4.5).
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use std::ops::RangeInclusive;

use subtle::ConstantTimeEq;

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::{Error, Result};
use crate::header_map::HeaderMap;
use crate::key::SecretKey;
use crate::keywrap::KeyManagementAlgorithm;

/// Direct encryption with a shared symmetric key.
pub struct Dir;

impl Algorithm for Dir {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::KeyManagement
    }

    fn code(&self) -> &'static str {
        "dir"
    }
}

impl KeyManagementAlgorithm for Dir {
    fn legal_cek_len(&self, kek_bits: u32) -> Vec<RangeInclusive<usize>> {
        let len = kek_bits as usize / 8;
        vec![len..=len]
    }

    fn encrypted_cek_len(&self, _kek_bits: u32, _cek_len: usize) -> usize {
        0
    }

    fn new_cek(&self, kek: &SecretKey, _header: &mut HeaderMap, cek: &mut [u8]) -> Result<()> {
        let secret = kek.symmetric()?;
        if secret.len() != cek.len() {
            return Err(Error::key_validation(format!(
                "direct key is {} bytes but the content encryption algorithm requires {}",
                secret.len(),
                cek.len()
            )));
        }
        cek.copy_from_slice(secret);
        Ok(())
    }

    fn try_wrap(
        &self, kek: &SecretKey, _header: &mut HeaderMap, cek: &[u8], _dest: &mut [u8],
    ) -> Result<Option<usize>> {
        // direct mode cannot transport an arbitrary CEK
        let secret = kek.symmetric()?;
        if secret.len() != cek.len() || !bool::from(secret.ct_eq(cek)) {
            return Err(Error::configuration("`dir` can only carry the shared key itself"));
        }
        Ok(Some(0))
    }

    fn try_unwrap(
        &self, kek: &SecretKey, _header: &HeaderMap, wrapped: &[u8], dest: &mut [u8],
    ) -> Result<Option<usize>> {
        let secret = kek.symmetric()?;
        if !wrapped.is_empty() || dest.len() < secret.len() {
            return Ok(None);
        }
        dest[..secret.len()].copy_from_slice(secret);
        Ok(Some(secret.len()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let kek = SecretKey::from_symmetric(vec![0x42_u8; 32]);
        let mut header = HeaderMap::new();
        let mut cek = [0_u8; 32];
        Dir.new_cek(&kek, &mut header, &mut cek).expect("should derive");
        assert_eq!(cek, [0x42; 32]);

        let mut dest = [0_u8; 0];
        let written = Dir
            .try_wrap(&kek, &mut header, &cek, &mut dest)
            .expect("should wrap")
            .expect("should fit");
        assert_eq!(written, 0);

        let mut out = [0_u8; 32];
        let n = Dir.try_unwrap(&kek, &header, &[], &mut out).expect("no format error");
        assert_eq!(n, Some(32));
        assert_eq!(out, [0x42; 32]);
    }

    #[test]
    fn non_empty_encrypted_key_rejected() {
        let kek = SecretKey::from_symmetric(vec![0x42_u8; 32]);
        let mut out = [0_u8; 32];
        assert_eq!(Dir.try_unwrap(&kek, &HeaderMap::new(), &[1], &mut out).expect("uniform"), None);
    }

    #[test]
    fn size_mismatch_rejected() {
        let kek = SecretKey::from_symmetric(vec![0x42_u8; 16]);
        let mut header = HeaderMap::new();
        let mut cek = [0_u8; 32];
        assert!(Dir.new_cek(&kek, &mut header, &mut cek).is_err());
    }
}
