//! ECDSA signatures over P-256 (ES256) and secp256k1 (ES256K).
//!
//! Signatures are the raw 64-byte `r || s` concatenation ([RFC7518]
//! §3.4), not DER. secp256k1 signatures are normalized to low-`s` before
//! verification so either encoding of `s` verifies.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use ecdsa::signature::{Signer, Verifier};

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::Result;
use crate::key::SecretKey;
use crate::sig::SignatureAlgorithm;

const SIGNATURE_LEN: usize = 64;

/// ECDSA using P-256 and SHA-256.
pub struct Es256;

/// ECDSA using secp256k1 and SHA-256.
pub struct Es256K;

impl Algorithm for Es256 {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Signature
    }

    fn code(&self) -> &'static str {
        "ES256"
    }
}

impl SignatureAlgorithm for Es256 {
    fn signature_len(&self, _key_bits: u32) -> usize {
        SIGNATURE_LEN
    }

    fn try_sign(&self, key: &SecretKey, input: &[u8], dest: &mut [u8]) -> Result<Option<usize>> {
        let signing = key.p256_signing()?;
        if dest.len() < SIGNATURE_LEN {
            return Ok(None);
        }

        let signature: p256::ecdsa::Signature = signing.sign(input);
        dest[..SIGNATURE_LEN].copy_from_slice(&signature.to_bytes());
        Ok(Some(SIGNATURE_LEN))
    }

    fn verify(&self, key: &SecretKey, input: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.len() != SIGNATURE_LEN {
            return Ok(false);
        }
        let verifying = key.p256_verifying()?;
        let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(verifying.verify(input, &signature).is_ok())
    }
}

impl Algorithm for Es256K {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Signature
    }

    fn code(&self) -> &'static str {
        "ES256K"
    }
}

impl SignatureAlgorithm for Es256K {
    fn signature_len(&self, _key_bits: u32) -> usize {
        SIGNATURE_LEN
    }

    fn try_sign(&self, key: &SecretKey, input: &[u8], dest: &mut [u8]) -> Result<Option<usize>> {
        let signing = key.k256_signing()?;
        if dest.len() < SIGNATURE_LEN {
            return Ok(None);
        }

        let signature: k256::ecdsa::Signature = signing.sign(input);
        dest[..SIGNATURE_LEN].copy_from_slice(&signature.to_bytes());
        Ok(Some(SIGNATURE_LEN))
    }

    fn verify(&self, key: &SecretKey, input: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.len() != SIGNATURE_LEN {
            return Ok(false);
        }
        let verifying = key.k256_verifying()?;
        let Ok(signature) = k256::ecdsa::Signature::from_slice(signature) else {
            return Ok(false);
        };
        let normalized = signature.normalize_s().unwrap_or(signature);
        Ok(verifying.verify(input, &normalized).is_ok())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn es256_round_trip() {
        let key = SecretKey::generate_p256();
        let mut sig = [0_u8; 64];
        let written =
            Es256.try_sign(&key, b"claims", &mut sig).expect("should sign").expect("should fit");
        assert_eq!(written, 64);
        assert!(Es256.verify(&key, b"claims", &sig).expect("should verify"));
        assert!(!Es256.verify(&key, b"other", &sig).expect("should verify"));
    }

    #[test]
    fn es256k_round_trip() {
        let key = SecretKey::generate_k256();
        let mut sig = [0_u8; 64];
        Es256K.try_sign(&key, b"claims", &mut sig).expect("should sign").expect("should fit");
        assert!(Es256K.verify(&key, b"claims", &sig).expect("should verify"));
    }

    #[test]
    fn wrong_key_fails() {
        let key = SecretKey::generate_p256();
        let other = SecretKey::generate_p256();
        let mut sig = [0_u8; 64];
        Es256.try_sign(&key, b"claims", &mut sig).expect("should sign");
        assert!(!Es256.verify(&other, b"claims", &sig).expect("should verify"));
    }

    #[test]
    fn wrong_key_shape() {
        let key = SecretKey::from_symmetric(vec![0_u8; 32]);
        let mut sig = [0_u8; 64];
        assert!(Es256.try_sign(&key, b"claims", &mut sig).is_err());
    }

    #[test]
    fn undersized_destination() {
        let key = SecretKey::generate_p256();
        let mut small = [0_u8; 63];
        assert_eq!(Es256.try_sign(&key, b"claims", &mut small).expect("should not error"), None);
    }
}
