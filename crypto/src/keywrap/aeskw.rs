//! AES Key Wrap (A128KW, A192KW, A256KW), [RFC3394] as profiled by
//! [RFC7518] §4.4. The wire form is the CEK plus an 8-byte integrity
//! block.
//!
//! [RFC3394]: https://www.rfc-editor.org/rfc/rfc3394
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use std::ops::RangeInclusive;

use aes_kw::Kek;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::{Error, Result};
use crate::header_map::HeaderMap;
use crate::key::SecretKey;
use crate::keywrap::KeyManagementAlgorithm;

const BLOCK: usize = 8;

/// AES-128 Key Wrap.
pub struct A128Kw;

/// AES-192 Key Wrap.
pub struct A192Kw;

/// AES-256 Key Wrap.
pub struct A256Kw;

fn check_cek_len(cek_len: usize) -> Result<()> {
    if cek_len < 16 || cek_len % BLOCK != 0 {
        return Err(Error::ParameterSize { name: "cek", expected: 16, actual: cek_len });
    }
    Ok(())
}

// RFC 3394 wrap with the cipher picked by wrapping-key length
pub(super) fn kw_wrap(kw_key: &[u8], cek: &[u8], dest: &mut [u8]) -> Result<Option<usize>> {
    check_cek_len(cek.len())?;
    let need = cek.len() + BLOCK;
    if dest.len() < need {
        return Ok(None);
    }

    let out = &mut dest[..need];
    let wrapped = match kw_key.len() {
        16 => Kek::<aes::Aes128>::from(to_array::<16>(kw_key)?).wrap(cek, out),
        24 => Kek::<aes::Aes192>::from(to_array::<24>(kw_key)?).wrap(cek, out),
        32 => Kek::<aes::Aes256>::from(to_array::<32>(kw_key)?).wrap(cek, out),
        len => {
            return Err(Error::key_validation(format!("AES key wrap key must be 16, 24, or 32 bytes, got {len}")));
        }
    };
    match wrapped {
        Ok(()) => Ok(Some(need)),
        Err(_) => Ok(None),
    }
}

// RFC 3394 unwrap; integrity failures surface exactly like an undersized
// destination
pub(super) fn kw_unwrap(kw_key: &[u8], wrapped: &[u8], dest: &mut [u8]) -> Result<Option<usize>> {
    if wrapped.len() < 16 + BLOCK || wrapped.len() % BLOCK != 0 {
        return Ok(None);
    }
    let need = wrapped.len() - BLOCK;
    if dest.len() < need {
        return Ok(None);
    }

    let out = &mut dest[..need];
    let unwrapped = match kw_key.len() {
        16 => Kek::<aes::Aes128>::from(to_array::<16>(kw_key)?).unwrap(wrapped, out),
        24 => Kek::<aes::Aes192>::from(to_array::<24>(kw_key)?).unwrap(wrapped, out),
        32 => Kek::<aes::Aes256>::from(to_array::<32>(kw_key)?).unwrap(wrapped, out),
        len => {
            return Err(Error::key_validation(format!("AES key wrap key must be 16, 24, or 32 bytes, got {len}")));
        }
    };
    match unwrapped {
        Ok(()) => Ok(Some(need)),
        Err(_) => {
            // wrong key or corrupt data; leave nothing behind
            out.fill(0);
            Ok(None)
        }
    }
}

fn to_array<const N: usize>(key: &[u8]) -> Result<[u8; N]> {
    key.try_into().map_err(|_| Error::key_validation("unexpected wrapping key length"))
}

macro_rules! aes_key_wrap {
    ($name:ident, $code:literal, $kek_bits:literal) => {
        impl Algorithm for $name {
            fn family(&self) -> AlgorithmFamily {
                AlgorithmFamily::KeyManagement
            }

            fn code(&self) -> &'static str {
                $code
            }
        }

        impl KeyManagementAlgorithm for $name {
            fn legal_cek_len(&self, _kek_bits: u32) -> Vec<RangeInclusive<usize>> {
                vec![16..=64]
            }

            fn encrypted_cek_len(&self, _kek_bits: u32, cek_len: usize) -> usize {
                cek_len + BLOCK
            }

            fn new_cek(
                &self, kek: &SecretKey, _header: &mut HeaderMap, cek: &mut [u8],
            ) -> Result<()> {
                kek.ensure_symmetric_bits(&[$kek_bits..=$kek_bits])?;
                check_cek_len(cek.len())?;
                OsRng.fill_bytes(cek);
                Ok(())
            }

            fn try_wrap(
                &self, kek: &SecretKey, _header: &mut HeaderMap, cek: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                let secret = kek.ensure_symmetric_bits(&[$kek_bits..=$kek_bits])?;
                kw_wrap(secret, cek, dest)
            }

            fn try_unwrap(
                &self, kek: &SecretKey, _header: &HeaderMap, wrapped: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                let secret = kek.ensure_symmetric_bits(&[$kek_bits..=$kek_bits])?;
                kw_unwrap(secret, wrapped, dest)
            }
        }
    };
}

aes_key_wrap!(A128Kw, "A128KW", 128);
aes_key_wrap!(A192Kw, "A192KW", 192);
aes_key_wrap!(A256Kw, "A256KW", 256);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rfc3394_vector() {
        // RFC 3394 §4.1: wrap 128 bits of key data with a 128-bit KEK
        let kek = SecretKey::from_symmetric(
            hex::decode("000102030405060708090A0B0C0D0E0F").expect("hex"),
        );
        let cek = hex::decode("00112233445566778899AABBCCDDEEFF").expect("hex");
        let expected =
            hex::decode("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5").expect("hex");

        let mut header = HeaderMap::new();
        let mut dest = [0_u8; 24];
        let written = A128Kw
            .try_wrap(&kek, &mut header, &cek, &mut dest)
            .expect("should wrap")
            .expect("should fit");
        assert_eq!(written, 24);
        assert_eq!(dest.to_vec(), expected);

        let mut out = [0_u8; 16];
        let n = A128Kw.try_unwrap(&kek, &header, &dest, &mut out).expect("no format error");
        assert_eq!(n, Some(16));
        assert_eq!(out.to_vec(), cek);
    }

    #[test]
    fn tampered_wrap_fails_uniformly() {
        let kek = SecretKey::from_symmetric(vec![7_u8; 32]);
        let mut header = HeaderMap::new();
        let mut cek = [0_u8; 32];
        let mut dest = [0_u8; 40];
        A256Kw.new_cek(&kek, &mut header, &mut cek).expect("should generate");
        A256Kw.try_wrap(&kek, &mut header, &cek, &mut dest).expect("should wrap");

        dest[3] ^= 0x01;
        let mut out = [0_u8; 32];
        assert_eq!(A256Kw.try_unwrap(&kek, &header, &dest, &mut out).expect("uniform"), None);
        assert_eq!(out, [0_u8; 32]);
    }

    #[test]
    fn undersized_destination() {
        let kek = SecretKey::from_symmetric(vec![7_u8; 16]);
        let mut header = HeaderMap::new();
        let cek = [1_u8; 16];
        let mut small = [0_u8; 23];
        assert_eq!(
            A128Kw.try_wrap(&kek, &mut header, &cek, &mut small).expect("no error"),
            None
        );
    }

    #[test]
    fn kek_size_enforced() {
        let kek = SecretKey::from_symmetric(vec![7_u8; 24]);
        let mut header = HeaderMap::new();
        let cek = [1_u8; 16];
        let mut dest = [0_u8; 24];
        assert!(A128Kw.try_wrap(&kek, &mut header, &cek, &mut dest).is_err());
    }
}
