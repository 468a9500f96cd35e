//! AES-CBC + HMAC composite content encryption (A128CBC-HS256,
//! A192CBC-HS384, A256CBC-HS512), [RFC7518] §5.2.
//!
//! The CEK is split in half: the initial half keys the MAC, the final
//! half keys the cipher. The tag is the truncated HMAC over
//! `aad || iv || ciphertext || be64(bitlen(aad))`. PKCS#7 padding always
//! adds at least one byte, so ciphertext size is the next block boundary
//! above the plaintext size — a full block even for an empty plaintext.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::aead::{check_size, ContentEncryptionAlgorithm};
use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::Result;

const BLOCK: usize = 16;
const NONCE_LEN: usize = 16;

/// AES-128-CBC with HMAC-SHA-256.
pub struct A128CbcHs256;

/// AES-192-CBC with HMAC-SHA-384.
pub struct A192CbcHs384;

/// AES-256-CBC with HMAC-SHA-512.
pub struct A256CbcHs512;

const fn padded_len(plaintext_len: usize) -> usize {
    // next multiple of the block size, minimum one full block
    (plaintext_len | (BLOCK - 1)) + 1
}

macro_rules! compute_tag {
    ($digest:ty, $mac_key:expr, $aad:expr, $iv:expr, $ciphertext:expr, $tag_len:literal) => {{
        // HMAC accepts any key length, so new_from_slice cannot fail here
        let mut full = [0_u8; $tag_len * 2];
        if let Ok(mut mac) = <Hmac<$digest>>::new_from_slice($mac_key) {
            mac.update($aad);
            mac.update($iv);
            mac.update($ciphertext);
            mac.update(&($aad.len() as u64 * 8).to_be_bytes());
            full.copy_from_slice(&mac.finalize().into_bytes());
        }
        let mut tag = [0_u8; $tag_len];
        tag.copy_from_slice(&full[..$tag_len]);
        tag
    }};
}

macro_rules! cbc_hmac_encryption {
    ($name:ident, $code:literal, $cipher:ty, $digest:ty, $cek_len:literal, $tag_len:literal) => {
        impl Algorithm for $name {
            fn family(&self) -> AlgorithmFamily {
                AlgorithmFamily::ContentEncryption
            }

            fn code(&self) -> &'static str {
                $code
            }
        }

        impl ContentEncryptionAlgorithm for $name {
            fn cek_len(&self) -> usize {
                $cek_len
            }

            fn nonce_len(&self) -> usize {
                NONCE_LEN
            }

            fn tag_len(&self) -> usize {
                $tag_len
            }

            fn ciphertext_len(&self, plaintext_len: usize) -> usize {
                padded_len(plaintext_len)
            }

            fn max_plaintext_len(&self, ciphertext_len: usize) -> usize {
                // padding strips at least one byte
                ciphertext_len.saturating_sub(1)
            }

            fn encrypt(
                &self, cek: &[u8], nonce: &[u8], plaintext: &[u8], aad: &[u8],
                ciphertext: &mut [u8], tag: &mut [u8],
            ) -> Result<()> {
                check_size("cek", $cek_len, cek.len())?;
                check_size("nonce", NONCE_LEN, nonce.len())?;
                check_size("ciphertext", padded_len(plaintext.len()), ciphertext.len())?;
                check_size("tag", $tag_len, tag.len())?;

                let (mac_key, enc_key) = cek.split_at($cek_len / 2);
                let encryptor = <cbc::Encryptor<$cipher>>::new_from_slices(enc_key, nonce)
                    .map_err(|e| crate::Error::configuration(format!("CBC key/iv: {e}")))?;
                encryptor
                    .encrypt_padded_b2b_mut::<Pkcs7>(plaintext, ciphertext)
                    .map_err(|e| crate::Error::configuration(format!("CBC padding: {e}")))?;

                let computed = compute_tag!($digest, mac_key, aad, nonce, ciphertext, $tag_len);
                tag.copy_from_slice(&computed);
                Ok(())
            }

            fn try_decrypt(
                &self, cek: &[u8], nonce: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8],
                plaintext: &mut [u8],
            ) -> Result<Option<usize>> {
                check_size("cek", $cek_len, cek.len())?;
                check_size("nonce", NONCE_LEN, nonce.len())?;
                if tag.len() != $tag_len
                    || ciphertext.is_empty()
                    || ciphertext.len() % BLOCK != 0
                    || plaintext.len() < ciphertext.len()
                {
                    return Ok(None);
                }

                // authenticate before any decryption
                let (mac_key, enc_key) = cek.split_at($cek_len / 2);
                let expected = compute_tag!($digest, mac_key, aad, nonce, ciphertext, $tag_len);
                if !bool::from(expected.ct_eq(tag)) {
                    return Ok(None);
                }

                let Ok(decryptor) = <cbc::Decryptor<$cipher>>::new_from_slices(enc_key, nonce)
                else {
                    return Ok(None);
                };
                // reduce to a length immediately so the output borrow ends
                let written = decryptor
                    .decrypt_padded_b2b_mut::<Pkcs7>(ciphertext, plaintext)
                    .map(<[u8]>::len);
                let Ok(written) = written else {
                    plaintext[..ciphertext.len()].fill(0);
                    return Ok(None);
                };
                // clear the padding remnants beyond the plaintext
                plaintext[written..ciphertext.len()].fill(0);
                Ok(Some(written))
            }
        }
    };
}

cbc_hmac_encryption!(A128CbcHs256, "A128CBC-HS256", aes::Aes128, Sha256, 32, 16);
cbc_hmac_encryption!(A192CbcHs384, "A192CBC-HS384", aes::Aes192, Sha384, 48, 24);
cbc_hmac_encryption!(A256CbcHs512, "A256CBC-HS512", aes::Aes256, Sha512, 64, 32);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ciphertext_sizing_table() {
        // next multiple of 16, minimum 16
        let cases = [
            (0_usize, 16_usize),
            (1, 16),
            (15, 16),
            (16, 32),
            (17, 32),
            (31, 32),
            (32, 48),
            (33, 48),
        ];
        for (plaintext_len, expected) in cases {
            assert_eq!(
                A128CbcHs256.ciphertext_len(plaintext_len),
                expected,
                "plaintext {plaintext_len}"
            );
        }
    }

    fn round_trip_one(alg: &dyn ContentEncryptionAlgorithm, plaintext: &[u8]) {
        let cek: Vec<u8> = (0..alg.cek_len()).map(|i| i as u8).collect();
        let nonce = vec![0x11_u8; alg.nonce_len()];
        let aad = b"protected";

        let mut ciphertext = vec![0_u8; alg.ciphertext_len(plaintext.len())];
        let mut tag = vec![0_u8; alg.tag_len()];
        alg.encrypt(&cek, &nonce, plaintext, aad, &mut ciphertext, &mut tag)
            .expect("should encrypt");

        let mut decrypted = vec![0_u8; ciphertext.len()];
        let n = alg
            .try_decrypt(&cek, &nonce, &ciphertext, aad, &tag, &mut decrypted)
            .expect("valid parameters")
            .expect("should authenticate");
        assert_eq!(&decrypted[..n], plaintext);
    }

    #[test]
    fn round_trip_all_variants() {
        for plaintext in [&b""[..], b"x", b"exactly sixteen!", b"just over sixteen"] {
            round_trip_one(&A128CbcHs256, plaintext);
            round_trip_one(&A192CbcHs384, plaintext);
            round_trip_one(&A256CbcHs512, plaintext);
        }
    }

    #[test]
    fn empty_plaintext_still_one_block() {
        let cek = [0_u8; 32];
        let nonce = [0_u8; 16];
        let mut ciphertext = vec![0_u8; 16];
        let mut tag = vec![0_u8; 16];
        A128CbcHs256
            .encrypt(&cek, &nonce, b"", b"", &mut ciphertext, &mut tag)
            .expect("should encrypt");
        assert_ne!(ciphertext, vec![0_u8; 16]);
    }

    #[test]
    fn tamper_rejection() {
        let cek: Vec<u8> = (0..32).collect();
        let nonce = [3_u8; 16];
        let plaintext = b"attack at dawn";
        let aad = b"hdr";
        let mut ciphertext = vec![0_u8; 16];
        let mut tag = vec![0_u8; 16];
        A128CbcHs256
            .encrypt(&cek, &nonce, plaintext, aad, &mut ciphertext, &mut tag)
            .expect("should encrypt");

        let mut out = vec![0_u8; 16];
        let mut bad = ciphertext.clone();
        bad[5] ^= 1;
        assert_eq!(
            A128CbcHs256.try_decrypt(&cek, &nonce, &bad, aad, &tag, &mut out).expect("params"),
            None
        );
        assert_eq!(out, vec![0_u8; 16]);

        let mut bad = tag.clone();
        bad[0] ^= 1;
        assert_eq!(
            A128CbcHs256
                .try_decrypt(&cek, &nonce, &ciphertext, aad, &bad, &mut out)
                .expect("params"),
            None
        );

        assert_eq!(
            A128CbcHs256
                .try_decrypt(&cek, &nonce, &ciphertext, b"other", &tag, &mut out)
                .expect("params"),
            None
        );
    }

    #[test]
    fn undersized_destination_matches_auth_failure() {
        let cek: Vec<u8> = (0..32).collect();
        let nonce = [3_u8; 16];
        let mut ciphertext = vec![0_u8; 16];
        let mut tag = vec![0_u8; 16];
        A128CbcHs256
            .encrypt(&cek, &nonce, b"hi", b"", &mut ciphertext, &mut tag)
            .expect("should encrypt");

        let mut small = vec![0_u8; 15];
        assert_eq!(
            A128CbcHs256
                .try_decrypt(&cek, &nonce, &ciphertext, b"", &tag, &mut small)
                .expect("params"),
            None
        );
    }
}
