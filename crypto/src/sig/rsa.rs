//! RSA signatures: PKCS#1 v1.5 (RS256/RS384/RS512) and PSS (PS256).
//!
//! Signature size equals the modulus size; 2048-bit keys are the floor
//! ([RFC7518] §3.3).
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, Pss};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::{Error, Result};
use crate::key::SecretKey;
use crate::sig::SignatureAlgorithm;

/// RSASSA-PKCS1-v1_5 using SHA-256.
pub struct Rs256;

/// RSASSA-PKCS1-v1_5 using SHA-384.
pub struct Rs384;

/// RSASSA-PKCS1-v1_5 using SHA-512.
pub struct Rs512;

/// RSASSA-PSS using SHA-256.
pub struct Ps256;

macro_rules! rsa_pkcs1_signature {
    ($name:ident, $code:literal, $digest:ty) => {
        impl Algorithm for $name {
            fn family(&self) -> AlgorithmFamily {
                AlgorithmFamily::Signature
            }

            fn code(&self) -> &'static str {
                $code
            }
        }

        impl SignatureAlgorithm for $name {
            fn signature_len(&self, key_bits: u32) -> usize {
                key_bits as usize / 8
            }

            fn try_sign(
                &self, key: &SecretKey, input: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                let private = key.rsa_private()?;
                let need = private.size();
                if dest.len() < need {
                    return Ok(None);
                }

                let digest = <$digest>::digest(input);
                let signature = private
                    .sign(Pkcs1v15Sign::new::<$digest>(), &digest)
                    .map_err(|e| Error::key_validation(format!("RSA signing: {e}")))?;
                dest[..need].copy_from_slice(&signature);
                Ok(Some(need))
            }

            fn verify(&self, key: &SecretKey, input: &[u8], signature: &[u8]) -> Result<bool> {
                let public = key.rsa_public()?;
                if signature.len() != public.size() {
                    return Ok(false);
                }
                let digest = <$digest>::digest(input);
                Ok(public.verify(Pkcs1v15Sign::new::<$digest>(), &digest, signature).is_ok())
            }
        }
    };
}

rsa_pkcs1_signature!(Rs256, "RS256", Sha256);
rsa_pkcs1_signature!(Rs384, "RS384", Sha384);
rsa_pkcs1_signature!(Rs512, "RS512", Sha512);

impl Algorithm for Ps256 {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Signature
    }

    fn code(&self) -> &'static str {
        "PS256"
    }
}

impl SignatureAlgorithm for Ps256 {
    fn signature_len(&self, key_bits: u32) -> usize {
        key_bits as usize / 8
    }

    fn try_sign(&self, key: &SecretKey, input: &[u8], dest: &mut [u8]) -> Result<Option<usize>> {
        let private = key.rsa_private()?;
        let need = private.size();
        if dest.len() < need {
            return Ok(None);
        }

        let digest = Sha256::digest(input);
        let signature = private
            .sign_with_rng(&mut OsRng, Pss::new::<Sha256>(), &digest)
            .map_err(|e| Error::key_validation(format!("RSA signing: {e}")))?;
        dest[..need].copy_from_slice(&signature);
        Ok(Some(need))
    }

    fn verify(&self, key: &SecretKey, input: &[u8], signature: &[u8]) -> Result<bool> {
        let public = key.rsa_public()?;
        if signature.len() != public.size() {
            return Ok(false);
        }
        let digest = Sha256::digest(input);
        Ok(public.verify(Pss::new::<Sha256>(), &digest, signature).is_ok())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // key generation dominates these tests, so one pair is shared
    fn key() -> &'static SecretKey {
        static KEY: std::sync::OnceLock<SecretKey> = std::sync::OnceLock::new();
        KEY.get_or_init(|| SecretKey::generate_rsa(2048).expect("should generate"))
    }

    #[test]
    fn rs256_round_trip() {
        let key = key();
        let mut sig = vec![0_u8; Rs256.signature_len(key.bit_len())];
        let written =
            Rs256.try_sign(key, b"claims", &mut sig).expect("should sign").expect("should fit");
        assert_eq!(written, 256);
        assert!(Rs256.verify(key, b"claims", &sig).expect("should verify"));
        assert!(!Rs256.verify(key, b"other", &sig).expect("should verify"));
    }

    #[test]
    fn ps256_round_trip() {
        let key = key();
        let mut sig = vec![0_u8; 256];
        Ps256.try_sign(key, b"claims", &mut sig).expect("should sign").expect("should fit");
        assert!(Ps256.verify(key, b"claims", &sig).expect("should verify"));
        // PSS is randomized; a PKCS#1 v1.5 verify of the same bytes must fail
        assert!(!Rs256.verify(key, b"claims", &sig).expect("should verify"));
    }

    #[test]
    fn undersized_destination() {
        let key = key();
        let mut small = vec![0_u8; 255];
        assert_eq!(Rs256.try_sign(key, b"claims", &mut small).expect("should not error"), None);
    }

    #[test]
    fn truncated_signature_rejected() {
        let key = key();
        let mut sig = vec![0_u8; 256];
        Rs256.try_sign(key, b"claims", &mut sig).expect("should sign");
        assert!(!Rs256.verify(key, b"claims", &sig[..255]).expect("should verify"));
    }
}
