//! XChaCha20-Poly1305 content encryption (`XC20P`,
//! [draft-irtf-cfrg-xchacha] as used by JOSE implementations in the
//! wild). 256-bit key, 192-bit nonce, 128-bit tag; stream-like sizing.
//!
//! [draft-irtf-cfrg-xchacha]: https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-xchacha

use chacha20poly1305::XChaCha20Poly1305;

use crate::aead::gcm::{decrypt_with, encrypt_with};
use crate::aead::{check_size, ContentEncryptionAlgorithm};
use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::Result;

const CEK_LEN: usize = 32;
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;

/// XChaCha20-Poly1305.
pub struct XC20P;

impl Algorithm for XC20P {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::ContentEncryption
    }

    fn code(&self) -> &'static str {
        "XC20P"
    }
}

impl ContentEncryptionAlgorithm for XC20P {
    fn cek_len(&self) -> usize {
        CEK_LEN
    }

    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    fn tag_len(&self) -> usize {
        TAG_LEN
    }

    fn ciphertext_len(&self, plaintext_len: usize) -> usize {
        plaintext_len
    }

    fn max_plaintext_len(&self, ciphertext_len: usize) -> usize {
        ciphertext_len
    }

    fn encrypt(
        &self, cek: &[u8], nonce: &[u8], plaintext: &[u8], aad: &[u8], ciphertext: &mut [u8],
        tag: &mut [u8],
    ) -> Result<()> {
        check_size("cek", CEK_LEN, cek.len())?;
        check_size("nonce", NONCE_LEN, nonce.len())?;
        check_size("ciphertext", plaintext.len(), ciphertext.len())?;
        check_size("tag", TAG_LEN, tag.len())?;
        encrypt_with::<XChaCha20Poly1305>(cek, nonce, plaintext, aad, ciphertext, tag)
    }

    fn try_decrypt(
        &self, cek: &[u8], nonce: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8],
        plaintext: &mut [u8],
    ) -> Result<Option<usize>> {
        check_size("cek", CEK_LEN, cek.len())?;
        check_size("nonce", NONCE_LEN, nonce.len())?;
        Ok(decrypt_with::<XChaCha20Poly1305>(cek, nonce, ciphertext, aad, tag, plaintext))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let cek = [9_u8; 32];
        let nonce = [4_u8; 24];
        let plaintext = b"extended nonces leave room for random generation";
        let aad = b"hdr";

        let mut ciphertext = vec![0_u8; plaintext.len()];
        let mut tag = [0_u8; 16];
        XC20P
            .encrypt(&cek, &nonce, plaintext, aad, &mut ciphertext, &mut tag)
            .expect("should encrypt");

        let mut decrypted = vec![0_u8; plaintext.len()];
        let n = XC20P
            .try_decrypt(&cek, &nonce, &ciphertext, aad, &tag, &mut decrypted)
            .expect("valid parameters")
            .expect("should authenticate");
        assert_eq!(&decrypted[..n], plaintext);
    }

    #[test]
    fn tampered_aad_rejected() {
        let cek = [9_u8; 32];
        let nonce = [4_u8; 24];
        let mut ciphertext = vec![0_u8; 5];
        let mut tag = [0_u8; 16];
        XC20P.encrypt(&cek, &nonce, b"hello", b"aad", &mut ciphertext, &mut tag).expect("encrypt");

        let mut out = vec![0_u8; 5];
        assert_eq!(
            XC20P.try_decrypt(&cek, &nonce, &ciphertext, b"AAD", &tag, &mut out).expect("params"),
            None
        );
    }
}
