//! HMAC keyed-hash signatures (HS256, HS384, HS512).
//!
//! Verification resigns the input and compares against the presented tag:
//! a length mismatch fails immediately, everything else goes through a
//! full-length constant-time comparison so a forged tag cannot be probed
//! byte by byte.

use std::ops::RangeInclusive;

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::Result;
use crate::key::SecretKey;
use crate::sig::SignatureAlgorithm;

// RFC 7518 §3.2: the key must be at least as long as the hash output
const LEGAL_HS256: &[RangeInclusive<u32>] = &[256..=u32::MAX];
const LEGAL_HS384: &[RangeInclusive<u32>] = &[384..=u32::MAX];
const LEGAL_HS512: &[RangeInclusive<u32>] = &[512..=u32::MAX];

/// HMAC using SHA-256.
pub struct Hs256;

/// HMAC using SHA-384.
pub struct Hs384;

/// HMAC using SHA-512.
pub struct Hs512;

macro_rules! hmac_signature {
    ($name:ident, $code:literal, $digest:ty, $tag_len:expr, $legal:expr) => {
        impl Algorithm for $name {
            fn family(&self) -> AlgorithmFamily {
                AlgorithmFamily::Signature
            }

            fn code(&self) -> &'static str {
                $code
            }
        }

        impl SignatureAlgorithm for $name {
            fn signature_len(&self, _key_bits: u32) -> usize {
                $tag_len
            }

            fn try_sign(
                &self, key: &SecretKey, input: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                let secret = key.ensure_symmetric_bits($legal)?;
                if dest.len() < $tag_len {
                    return Ok(None);
                }

                let mut mac = <Hmac<$digest>>::new_from_slice(secret)
                    .map_err(|e| crate::Error::key_validation(format!("HMAC key: {e}")))?;
                mac.update(input);
                dest[..$tag_len].copy_from_slice(&mac.finalize().into_bytes());
                Ok(Some($tag_len))
            }

            fn verify(&self, key: &SecretKey, input: &[u8], signature: &[u8]) -> Result<bool> {
                if signature.len() != $tag_len {
                    return Ok(false);
                }

                let mut expected = [0_u8; $tag_len];
                match self.try_sign(key, input, &mut expected)? {
                    Some(_) => Ok(bool::from(expected.ct_eq(signature))),
                    None => Ok(false),
                }
            }
        }
    };
}

hmac_signature!(Hs256, "HS256", Sha256, 32, LEGAL_HS256);
hmac_signature!(Hs384, "HS384", Sha384, 48, LEGAL_HS384);
hmac_signature!(Hs512, "HS512", Sha512, 64, LEGAL_HS512);

#[cfg(test)]
mod test {
    use super::*;

    fn key() -> SecretKey {
        SecretKey::from_symmetric(vec![0x0b_u8; 32])
    }

    #[test]
    fn sign_and_verify() {
        let key = key();
        let mut sig = [0_u8; 32];
        let written =
            Hs256.try_sign(&key, b"payload", &mut sig).expect("should sign").expect("should fit");
        assert_eq!(written, 32);
        assert!(Hs256.verify(&key, b"payload", &sig).expect("should verify"));
        assert!(!Hs256.verify(&key, b"tampered", &sig).expect("should verify"));
    }

    #[test]
    fn rfc7515_appendix_a1_vector() {
        // signing input and HS256 tag from RFC 7515 appendix A.1
        let secret = crate::b64::decode(
            "AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow",
        )
        .expect("should decode");
        let key = SecretKey::from_symmetric(secret);
        let input = "eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9.eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ";

        let mut sig = [0_u8; 32];
        Hs256.try_sign(&key, input.as_bytes(), &mut sig).expect("should sign");
        assert_eq!(crate::b64::encode(&sig), "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
    }

    #[test]
    fn wrong_length_rejected_fast() {
        let key = key();
        let mut sig = [0_u8; 32];
        Hs256.try_sign(&key, b"payload", &mut sig).expect("should sign");
        assert!(!Hs256.verify(&key, b"payload", &sig[..31]).expect("should verify"));
    }

    #[test]
    fn undersized_destination() {
        let key = key();
        let mut small = [0_u8; 31];
        assert_eq!(Hs256.try_sign(&key, b"payload", &mut small).expect("should not error"), None);
        assert_eq!(small, [0_u8; 31]);
    }

    #[test]
    fn short_key_rejected() {
        let key = SecretKey::from_symmetric(vec![0_u8; 31]);
        let mut sig = [0_u8; 32];
        assert!(Hs256.try_sign(&key, b"payload", &mut sig).is_err());
    }

    #[test]
    fn hs512_key_floor() {
        // 512-bit boundary key passes, 511 bits cannot exist; 63 bytes fails
        let key = SecretKey::from_symmetric(vec![0_u8; 64]);
        let mut sig = [0_u8; 64];
        assert!(Hs512.try_sign(&key, b"x", &mut sig).expect("should sign").is_some());

        let short = SecretKey::from_symmetric(vec![0_u8; 63]);
        assert!(Hs512.try_sign(&short, b"x", &mut sig).is_err());
    }
}
