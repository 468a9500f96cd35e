//! AES-GCM content encryption (A128GCM, A192GCM, A256GCM), [RFC7518]
//! §5.3. Stream-like: ciphertext size equals plaintext size; 96-bit
//! nonce, 128-bit tag.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::KeyInit;
use aes_gcm::{AeadInPlace, Aes128Gcm, Aes256Gcm, AesGcm, Key, Nonce, Tag};

use crate::aead::{check_size, ContentEncryptionAlgorithm};
use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::Result;

type Aes192Gcm = AesGcm<aes::Aes192, U12>;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AES-GCM with a 128-bit key.
pub struct A128Gcm;

/// AES-GCM with a 192-bit key.
pub struct A192Gcm;

/// AES-GCM with a 256-bit key.
pub struct A256Gcm;

pub(super) fn encrypt_with<C: AeadInPlace + KeyInit>(
    cek: &[u8], nonce: &[u8], plaintext: &[u8], aad: &[u8], ciphertext: &mut [u8],
    tag: &mut [u8],
) -> Result<()> {
    let key = Key::<C>::from_slice(cek);
    let nonce = Nonce::<C::NonceSize>::from_slice(nonce);

    let buffer = &mut ciphertext[..plaintext.len()];
    buffer.copy_from_slice(plaintext);
    let computed = C::new(key)
        .encrypt_in_place_detached(nonce, aad, buffer)
        .map_err(|e| crate::Error::configuration(format!("issue encrypting: {e}")))?;
    tag.copy_from_slice(&computed);
    Ok(())
}

pub(super) fn decrypt_with<C: AeadInPlace + KeyInit>(
    cek: &[u8], nonce: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8],
    plaintext: &mut [u8],
) -> Option<usize> {
    if tag.len() != TAG_LEN || plaintext.len() < ciphertext.len() {
        return None;
    }
    let key = Key::<C>::from_slice(cek);
    let nonce = Nonce::<C::NonceSize>::from_slice(nonce);
    let tag = Tag::<C::TagSize>::from_slice(tag);

    let buffer = &mut plaintext[..ciphertext.len()];
    buffer.copy_from_slice(ciphertext);
    match C::new(key).decrypt_in_place_detached(nonce, aad, buffer, tag) {
        Ok(()) => Some(ciphertext.len()),
        Err(_) => {
            // no partial plaintext on failure
            buffer.fill(0);
            None
        }
    }
}

macro_rules! aes_gcm_encryption {
    ($name:ident, $code:literal, $cipher:ty, $cek_len:literal) => {
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
                TAG_LEN
            }

            fn ciphertext_len(&self, plaintext_len: usize) -> usize {
                plaintext_len
            }

            fn max_plaintext_len(&self, ciphertext_len: usize) -> usize {
                ciphertext_len
            }

            fn encrypt(
                &self, cek: &[u8], nonce: &[u8], plaintext: &[u8], aad: &[u8],
                ciphertext: &mut [u8], tag: &mut [u8],
            ) -> Result<()> {
                check_size("cek", $cek_len, cek.len())?;
                check_size("nonce", NONCE_LEN, nonce.len())?;
                check_size("ciphertext", plaintext.len(), ciphertext.len())?;
                check_size("tag", TAG_LEN, tag.len())?;
                encrypt_with::<$cipher>(cek, nonce, plaintext, aad, ciphertext, tag)
            }

            fn try_decrypt(
                &self, cek: &[u8], nonce: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8],
                plaintext: &mut [u8],
            ) -> Result<Option<usize>> {
                check_size("cek", $cek_len, cek.len())?;
                check_size("nonce", NONCE_LEN, nonce.len())?;
                Ok(decrypt_with::<$cipher>(cek, nonce, ciphertext, aad, tag, plaintext))
            }
        }
    };
}

aes_gcm_encryption!(A128Gcm, "A128GCM", Aes128Gcm, 16);
aes_gcm_encryption!(A192Gcm, "A192GCM", Aes192Gcm, 24);
aes_gcm_encryption!(A256Gcm, "A256GCM", Aes256Gcm, 32);
