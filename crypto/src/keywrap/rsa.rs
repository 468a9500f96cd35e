//! RSA key encryption: RSAES-PKCS1-v1_5 (`RSA1_5`) and RSAES-OAEP
//! (`RSA-OAEP` with SHA-1 per [RFC7518] §4.3, `RSA-OAEP-256` with
//! SHA-256).
//!
//! Unwrap failures — wrong key, corrupt ciphertext, bad padding — all
//! surface as the same uniform `None`, so the classic PKCS#1 v1.5 padding
//! oracle cannot be reconstructed from the API.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use std::ops::RangeInclusive;

use rand::RngCore;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Encrypt};
use sha1::Sha1;
use sha2::Sha256;

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::{Error, Result};
use crate::header_map::HeaderMap;
use crate::key::SecretKey;
use crate::keywrap::KeyManagementAlgorithm;

/// RSAES-PKCS1-v1_5 key encryption.
pub struct Rsa15;

/// RSAES-OAEP key encryption using SHA-1 (the RFC 7518 `RSA-OAEP`
/// profile).
pub struct RsaOaep;

/// RSAES-OAEP key encryption using SHA-256.
pub struct RsaOaep256;

enum Padding {
    Pkcs1,
    OaepSha1,
    OaepSha256,
}

impl Padding {
    // bytes of modulus the padding scheme consumes
    const fn overhead(&self) -> usize {
        match self {
            Self::Pkcs1 => 11,
            Self::OaepSha1 => 2 * 20 + 2,
            Self::OaepSha256 => 2 * 32 + 2,
        }
    }
}

fn wrap(
    padding: &Padding, kek: &SecretKey, cek: &[u8], dest: &mut [u8],
) -> Result<Option<usize>> {
    let public = kek.rsa_public()?;
    let need = public.size();
    let max_cek = need.saturating_sub(padding.overhead());
    if cek.len() > max_cek {
        return Err(Error::ParameterSize { name: "cek", expected: max_cek, actual: cek.len() });
    }
    if dest.len() < need {
        return Ok(None);
    }

    let encrypted = match padding {
        Padding::Pkcs1 => public.encrypt(&mut OsRng, Pkcs1v15Encrypt, cek),
        Padding::OaepSha1 => public.encrypt(&mut OsRng, Oaep::new::<Sha1>(), cek),
        Padding::OaepSha256 => public.encrypt(&mut OsRng, Oaep::new::<Sha256>(), cek),
    }
    .map_err(|e| Error::key_validation(format!("RSA key encryption: {e}")))?;
    dest[..need].copy_from_slice(&encrypted);
    Ok(Some(need))
}

fn unwrap(
    padding: &Padding, kek: &SecretKey, wrapped: &[u8], dest: &mut [u8],
) -> Result<Option<usize>> {
    let private = kek.rsa_private()?;
    if wrapped.len() != private.size() {
        return Ok(None);
    }

    // decryption and padding failures are indistinguishable from an
    // undersized destination by design
    let decrypted = match padding {
        Padding::Pkcs1 => private.decrypt(Pkcs1v15Encrypt, wrapped),
        Padding::OaepSha1 => private.decrypt(Oaep::new::<Sha1>(), wrapped),
        Padding::OaepSha256 => private.decrypt(Oaep::new::<Sha256>(), wrapped),
    };
    let Ok(decrypted) = decrypted else {
        return Ok(None);
    };
    let decrypted = zeroize::Zeroizing::new(decrypted);
    if dest.len() < decrypted.len() {
        return Ok(None);
    }
    dest[..decrypted.len()].copy_from_slice(&decrypted);
    Ok(Some(decrypted.len()))
}

macro_rules! rsa_key_management {
    ($name:ident, $code:literal, $padding:expr) => {
        impl Algorithm for $name {
            fn family(&self) -> AlgorithmFamily {
                AlgorithmFamily::KeyManagement
            }

            fn code(&self) -> &'static str {
                $code
            }
        }

        impl KeyManagementAlgorithm for $name {
            fn legal_cek_len(&self, kek_bits: u32) -> Vec<RangeInclusive<usize>> {
                let max = (kek_bits as usize / 8).saturating_sub($padding.overhead());
                vec![1..=max]
            }

            fn encrypted_cek_len(&self, kek_bits: u32, _cek_len: usize) -> usize {
                kek_bits as usize / 8
            }

            fn new_cek(
                &self, kek: &SecretKey, _header: &mut HeaderMap, cek: &mut [u8],
            ) -> Result<()> {
                let public = kek.rsa_public()?;
                let max_cek = public.size().saturating_sub($padding.overhead());
                if cek.len() > max_cek {
                    return Err(Error::ParameterSize {
                        name: "cek",
                        expected: max_cek,
                        actual: cek.len(),
                    });
                }
                OsRng.fill_bytes(cek);
                Ok(())
            }

            fn try_wrap(
                &self, kek: &SecretKey, _header: &mut HeaderMap, cek: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                wrap(&$padding, kek, cek, dest)
            }

            fn try_unwrap(
                &self, kek: &SecretKey, _header: &HeaderMap, wrapped: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                unwrap(&$padding, kek, wrapped, dest)
            }
        }
    };
}

rsa_key_management!(Rsa15, "RSA1_5", Padding::Pkcs1);
rsa_key_management!(RsaOaep, "RSA-OAEP", Padding::OaepSha1);
rsa_key_management!(RsaOaep256, "RSA-OAEP-256", Padding::OaepSha256);

#[cfg(test)]
mod test {
    use super::*;

    fn kek() -> &'static SecretKey {
        static KEY: std::sync::OnceLock<SecretKey> = std::sync::OnceLock::new();
        KEY.get_or_init(|| SecretKey::generate_rsa(2048).expect("should generate"))
    }

    #[test]
    fn oaep_round_trip() {
        let kek = kek();
        let mut header = HeaderMap::new();
        let mut cek = [0_u8; 32];
        let mut wrapped = vec![0_u8; 256];
        let written = RsaOaep256
            .try_wrap_new(kek, &mut header, &mut cek, &mut wrapped)
            .expect("should wrap")
            .expect("should fit");
        assert_eq!(written, 256);
        assert_ne!(cek, [0_u8; 32]);

        let mut out = [0_u8; 32];
        let n = RsaOaep256.try_unwrap(kek, &header, &wrapped, &mut out).expect("no format error");
        assert_eq!(n, Some(32));
        assert_eq!(out, cek);
    }

    #[test]
    fn pkcs1_round_trip() {
        let kek = kek();
        let mut header = HeaderMap::new();
        let mut cek = [0_u8; 16];
        let mut wrapped = vec![0_u8; 256];
        Rsa15
            .try_wrap_new(kek, &mut header, &mut cek, &mut wrapped)
            .expect("should wrap")
            .expect("should fit");

        let mut out = [0_u8; 16];
        assert_eq!(
            Rsa15.try_unwrap(kek, &header, &wrapped, &mut out).expect("no format error"),
            Some(16)
        );
        assert_eq!(out, cek);
    }

    #[test]
    fn tampered_ciphertext_fails_uniformly() {
        let kek = kek();
        let mut header = HeaderMap::new();
        let mut cek = [0_u8; 32];
        let mut wrapped = vec![0_u8; 256];
        RsaOaep
            .try_wrap_new(kek, &mut header, &mut cek, &mut wrapped)
            .expect("should wrap");

        wrapped[100] ^= 0x01;
        let mut out = [0_u8; 32];
        assert_eq!(RsaOaep.try_unwrap(kek, &header, &wrapped, &mut out).expect("uniform"), None);
    }

    #[test]
    fn oversized_cek_named() {
        let kek = kek();
        let mut header = HeaderMap::new();
        let cek = [0_u8; 256];
        let mut wrapped = vec![0_u8; 256];
        let err = RsaOaep256
            .try_wrap(kek, &mut header, &cek, &mut wrapped)
            .expect_err("should reject");
        assert!(matches!(err, Error::ParameterSize { name: "cek", .. }));
    }
}
