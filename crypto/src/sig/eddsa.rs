//! EdDSA signatures over Ed25519 ([RFC8037]).
//!
//! [RFC8037]: https://www.rfc-editor.org/rfc/rfc8037

use ed25519_dalek::{Signer, Verifier};

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::Result;
use crate::key::SecretKey;
use crate::sig::SignatureAlgorithm;

const SIGNATURE_LEN: usize = 64;

/// EdDSA using Ed25519.
pub struct EdDsa;

impl Algorithm for EdDsa {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Signature
    }

    fn code(&self) -> &'static str {
        "EdDSA"
    }
}

impl SignatureAlgorithm for EdDsa {
    fn signature_len(&self, _key_bits: u32) -> usize {
        SIGNATURE_LEN
    }

    fn try_sign(&self, key: &SecretKey, input: &[u8], dest: &mut [u8]) -> Result<Option<usize>> {
        let signing = key.ed25519_signing()?;
        if dest.len() < SIGNATURE_LEN {
            return Ok(None);
        }

        let signature = signing.sign(input);
        dest[..SIGNATURE_LEN].copy_from_slice(&signature.to_bytes());
        Ok(Some(SIGNATURE_LEN))
    }

    fn verify(&self, key: &SecretKey, input: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.len() != SIGNATURE_LEN {
            return Ok(false);
        }
        let verifying = key.ed25519_verifying()?;
        let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(verifying.verify(input, &signature).is_ok())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let key = SecretKey::generate_ed25519();
        let mut sig = [0_u8; 64];
        let written =
            EdDsa.try_sign(&key, b"claims", &mut sig).expect("should sign").expect("should fit");
        assert_eq!(written, 64);
        assert!(EdDsa.verify(&key, b"claims", &sig).expect("should verify"));
        assert!(!EdDsa.verify(&key, b"other", &sig).expect("should verify"));
    }

    #[test]
    fn deterministic_seed() {
        let key = SecretKey::from_ed25519_seed(&[7_u8; 32]).expect("should import");
        let again = SecretKey::from_ed25519_seed(&[7_u8; 32]).expect("should import");
        let mut a = [0_u8; 64];
        let mut b = [0_u8; 64];
        EdDsa.try_sign(&key, b"claims", &mut a).expect("should sign");
        EdDsa.try_sign(&again, b"claims", &mut b).expect("should sign");
        assert_eq!(a, b);
    }
}
