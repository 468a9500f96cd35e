//! PBES2 password-based key wrapping (PBES2-HS256+A128KW,
//! PBES2-HS384+A192KW, PBES2-HS512+A256KW), [RFC7518] §4.8.
//!
//! The wrapping key is derived with PBKDF2 over the UTF-8 password; the
//! salt input is `alg || 0x00 || p2s` and the iteration count is `p2c`,
//! both carried in the header. Iteration counts are bounded on the decode
//! side so a hostile token cannot buy unbounded CPU.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use std::ops::RangeInclusive;

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::b64;
use crate::error::{Error, Result};
use crate::header_map::HeaderMap;
use crate::key::SecretKey;
use crate::keywrap::aeskw::{kw_unwrap, kw_wrap};
use crate::keywrap::KeyManagementAlgorithm;

/// Iterations applied when the caller does not supply `p2c`.
const DEFAULT_ITERATIONS: u64 = 100_000;

/// RFC 7518 floor.
const MIN_ITERATIONS: u64 = 1000;

/// Upper bound honoured when decoding untrusted tokens.
const MAX_ITERATIONS: u64 = 10_000_000;

const SALT_LEN: usize = 16;

/// PBES2 with HMAC-SHA-256 and A128KW.
pub struct Pbes2Hs256A128Kw;

/// PBES2 with HMAC-SHA-384 and A192KW.
pub struct Pbes2Hs384A192Kw;

/// PBES2 with HMAC-SHA-512 and A256KW.
pub struct Pbes2Hs512A256Kw;

fn salt_input(code: &str, p2s: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(code.len() + 1 + p2s.len());
    input.extend_from_slice(code.as_bytes());
    input.push(0);
    input.extend_from_slice(p2s);
    input
}

fn read_iterations(header: &HeaderMap) -> Result<u64> {
    let p2c =
        header.get_u64("p2c").ok_or_else(|| Error::format("missing `p2c` header entry"))?;
    if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&p2c) {
        return Err(Error::format(format!("`p2c` {p2c} is out of range")));
    }
    Ok(p2c)
}

fn read_salt(header: &HeaderMap) -> Result<Vec<u8>> {
    let p2s =
        header.get_str("p2s").ok_or_else(|| Error::format("missing `p2s` header entry"))?;
    let p2s = b64::decode(p2s)?;
    if p2s.len() < 8 {
        return Err(Error::format("`p2s` must be at least 8 octets"));
    }
    Ok(p2s)
}

macro_rules! pbes2_key_wrap {
    ($name:ident, $code:literal, $digest:ty, $kw_bytes:literal) => {
        impl $name {
            fn derive(password: &[u8], salt: &[u8], iterations: u64) -> Zeroizing<[u8; $kw_bytes]> {
                let mut kw_key = Zeroizing::new([0_u8; $kw_bytes]);
                let salt = salt_input($code, salt);
                pbkdf2_hmac::<$digest>(
                    password,
                    &salt,
                    u32::try_from(iterations).unwrap_or(u32::MAX),
                    &mut kw_key[..],
                );
                kw_key
            }
        }

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
                cek_len + 8
            }

            fn new_cek(
                &self, kek: &SecretKey, _header: &mut HeaderMap, cek: &mut [u8],
            ) -> Result<()> {
                let password = kek.symmetric()?;
                if password.is_empty() {
                    return Err(Error::key_validation("PBES2 password must not be empty"));
                }
                if cek.len() < 16 || cek.len() % 8 != 0 {
                    return Err(Error::ParameterSize { name: "cek", expected: 16, actual: cek.len() });
                }
                OsRng.fill_bytes(cek);
                Ok(())
            }

            fn try_wrap(
                &self, kek: &SecretKey, header: &mut HeaderMap, cek: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                let password = kek.symmetric()?;
                if password.is_empty() {
                    return Err(Error::key_validation("PBES2 password must not be empty"));
                }
                if dest.len() < cek.len() + 8 {
                    return Ok(None);
                }

                // honour caller-supplied parameters, fill in the rest
                let iterations = match header.get_u64("p2c") {
                    Some(p2c) if (MIN_ITERATIONS..=MAX_ITERATIONS).contains(&p2c) => p2c,
                    Some(p2c) => {
                        return Err(Error::configuration(format!("`p2c` {p2c} is out of range")));
                    }
                    None => {
                        header.insert("p2c", DEFAULT_ITERATIONS);
                        DEFAULT_ITERATIONS
                    }
                };
                let salt = match header.get_str("p2s") {
                    Some(encoded) => {
                        let salt = b64::decode(encoded)?;
                        if salt.len() < 8 {
                            return Err(Error::configuration("`p2s` must be at least 8 octets"));
                        }
                        salt
                    }
                    None => {
                        let mut salt = vec![0_u8; SALT_LEN];
                        OsRng.fill_bytes(&mut salt);
                        header.insert("p2s", b64::encode(&salt));
                        salt
                    }
                };

                let kw_key = Self::derive(password, &salt, iterations);
                kw_wrap(&kw_key[..], cek, dest)
            }

            fn try_unwrap(
                &self, kek: &SecretKey, header: &HeaderMap, wrapped: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                let password = kek.symmetric()?;
                if password.is_empty() {
                    return Err(Error::key_validation("PBES2 password must not be empty"));
                }
                let iterations = read_iterations(header)?;
                let salt = read_salt(header)?;

                let kw_key = Self::derive(password, &salt, iterations);
                kw_unwrap(&kw_key[..], wrapped, dest)
            }
        }
    };
}

pbes2_key_wrap!(Pbes2Hs256A128Kw, "PBES2-HS256+A128KW", Sha256, 16);
pbes2_key_wrap!(Pbes2Hs384A192Kw, "PBES2-HS384+A192KW", Sha384, 24);
pbes2_key_wrap!(Pbes2Hs512A256Kw, "PBES2-HS512+A256KW", Sha512, 32);
