//! # JSON Web Encryption (JWE)
//!
//! JWE ([RFC7516]) represents encrypted content using the compact
//! serialization: five base64url segments — protected header, encrypted
//! key, initialization vector, ciphertext, authentication tag — joined
//! by `.`.
//!
//! Encoding runs the pipeline in order: the key management algorithm
//! produces or wraps the content encryption key (adding its header
//! entries while the header is still mutable), the header is then
//! finalized and its base64url encoding becomes the AEAD associated
//! data, the payload is optionally DEFLATE-compressed, and the content
//! encryption algorithm produces ciphertext and tag. The CEK lives in a
//! pooled, zero-on-drop lease for the whole call, error paths included.
//!
//! Decoding reverses the pipeline; every cryptographic failure — CEK
//! unwrap, tag check — collapses into the one generic
//! [`Error::Verification`].
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sigil_crypto::{AlgorithmRegistry, Error, HeaderMap, Result, SecretKey, b64, rent};
use zeroize::Zeroizing;

use crate::header::Header;
use crate::jws::{BytesPayload, NoPayload, Payload, PayloadBytes, reject_critical_extensions};
use crate::jwt::Jwt;
use crate::token::Compact;

/// Encryption credentials: a borrowed key-encryption key plus the key
/// management and content encryption algorithm codes to run it under.
pub struct EncryptionCredentials<'a> {
    /// The key encryption key (or password, or agreement key); borrowed
    /// read-only for the duration of a call.
    pub key: &'a SecretKey,

    /// Key management algorithm code (`dir`, `A256KW`, `ECDH-ES`, ...).
    pub algorithm: String,

    /// Content encryption algorithm code (`A256GCM`, `A128CBC-HS256`,
    /// ...).
    pub encryption: String,
}

impl<'a> EncryptionCredentials<'a> {
    /// Pair a key with explicit algorithm codes.
    pub fn new(
        key: &'a SecretKey, algorithm: impl Into<String>, encryption: impl Into<String>,
    ) -> Self {
        Self { key, algorithm: algorithm.into(), encryption: encryption.into() }
    }
}

/// Encrypt the payload as a compact JWE.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAlgorithm`] for unknown algorithm codes,
/// [`Error::KeyValidation`] for a key the key management algorithm
/// rejects, and [`Error::Format`] when the payload cannot be serialized.
/// Nothing is emitted on failure.
pub fn encrypt<T>(payload: &T, credentials: &EncryptionCredentials<'_>) -> Result<String>
where
    T: Serialize,
{
    tracing::debug!("encrypt");

    JweBuilder::new()
        .key_algorithm(credentials.algorithm.clone())
        .content_algorithm(credentials.encryption.clone())
        .payload(payload)
        .recipient(credentials.key)
        .build()
}

/// Decrypt a compact JWE and deserialize the payload.
///
/// # Errors
///
/// Returns [`Error::Format`] for a malformed token,
/// [`Error::UnsupportedAlgorithm`] for unregistered codes, and
/// [`Error::Verification`] for any cryptographic failure.
pub fn decrypt<T>(token: &str, key: &SecretKey) -> Result<Jwt<T>>
where
    T: DeserializeOwned,
{
    tracing::debug!("decrypt");

    let (header, payload) = decrypt_bytes(token, key)?;
    let claims = serde_json::from_slice(&payload)
        .map_err(|e| Error::format(format!("issue deserializing payload: {e}")))?;
    Ok(Jwt { header, claims })
}

/// Decrypt a compact JWE, returning the raw payload bytes.
///
/// # Errors
///
/// As for [`decrypt`].
pub fn decrypt_bytes(token: &str, key: &SecretKey) -> Result<(Header, Vec<u8>)> {
    decrypt_bytes_with(token, key, AlgorithmRegistry::shared())
}

/// [`decrypt_bytes`] against a caller-supplied registry.
///
/// # Errors
///
/// As for [`decrypt`].
pub fn decrypt_bytes_with(
    token: &str, key: &SecretKey, registry: &AlgorithmRegistry,
) -> Result<(Header, Vec<u8>)> {
    let jwe = token.parse::<Compact>()?.into_jwe()?;
    let header = jwe.header;
    reject_critical_extensions(&header)?;

    let alg = header.alg().ok_or_else(|| Error::format("missing `alg` header entry"))?;
    let enc = header.enc().ok_or_else(|| Error::format("missing `enc` header entry"))?;
    if let Some(bound) = &key.metadata().algorithm
        && bound != alg
    {
        return Err(Error::Verification);
    }

    let key_management = registry.key_management(alg)?;
    let encryption = registry.content_encryption(enc)?;
    let compression = header.zip().map(|code| registry.compression(code)).transpose()?;

    let encrypted_key = b64::decode(&jwe.encrypted_key)?;
    let iv = b64::decode(&jwe.iv)?;
    let ciphertext = b64::decode(&jwe.ciphertext)?;
    let tag = b64::decode(&jwe.tag)?;

    // unwrap the CEK into a zeroed-on-drop lease
    let mut cek = rent(encryption.cek_len());
    match key_management.try_unwrap(key, header.map(), &encrypted_key, &mut cek) {
        Ok(Some(written)) if written == encryption.cek_len() => {}
        Ok(_) => return Err(Error::Verification),
        Err(e @ Error::Format(_)) => return Err(e),
        Err(e) => {
            tracing::debug!("key unwrap failed: {e}");
            return Err(Error::Verification);
        }
    }

    // the AAD is the verbatim received header segment
    let mut plaintext = rent(ciphertext.len().max(1));
    let written = match encryption.try_decrypt(
        &cek,
        &iv,
        &ciphertext,
        header.encoded().as_bytes(),
        &tag,
        &mut plaintext,
    ) {
        Ok(Some(written)) => written,
        _ => return Err(Error::Verification),
    };
    plaintext.truncate(written);

    let payload = match compression {
        Some(compression) => {
            let mut decompressed = Vec::new();
            compression.decompress(&plaintext, &mut decompressed)?;
            decompressed
        }
        None => plaintext.to_vec(),
    };

    Ok((header, payload))
}

/// Builds an encrypted compact JWE from a payload and a recipient key.
pub struct JweBuilder<'a, P, R> {
    algorithm: String,
    encryption: String,
    zip: Option<String>,
    typ: Option<String>,
    extra: HeaderMap,
    registry: Option<&'a AlgorithmRegistry>,
    payload: P,
    recipient: R,
}

#[doc(hidden)]
/// Typestate generic for a JWE builder with no recipient.
pub struct NoRecipient;
#[doc(hidden)]
/// Typestate generic for a JWE builder with a recipient key.
pub struct WithRecipient<'k>(&'k SecretKey);

impl Default for JweBuilder<'_, NoPayload, NoRecipient> {
    fn default() -> Self {
        Self::new()
    }
}

impl JweBuilder<'_, NoPayload, NoRecipient> {
    /// Returns a new [`JweBuilder`] with the default `ECDH-ES` /
    /// `A256GCM` algorithms.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: "ECDH-ES".into(),
            encryption: "A256GCM".into(),
            zip: None,
            typ: None,
            extra: HeaderMap::new(),
            registry: None,
            payload: NoPayload,
            recipient: NoRecipient,
        }
    }
}

impl<'a, R> JweBuilder<'a, NoPayload, R> {
    /// Set the payload to be encrypted.
    #[must_use]
    pub fn payload<'p, T: Serialize>(self, payload: &'p T) -> JweBuilder<'a, Payload<'p, T>, R> {
        JweBuilder {
            algorithm: self.algorithm,
            encryption: self.encryption,
            zip: self.zip,
            typ: self.typ,
            extra: self.extra,
            registry: self.registry,
            payload: Payload(payload),
            recipient: self.recipient,
        }
    }

    /// Set raw payload bytes to be encrypted.
    #[must_use]
    pub fn payload_bytes<'p>(self, payload: &'p [u8]) -> JweBuilder<'a, BytesPayload<'p>, R> {
        JweBuilder {
            algorithm: self.algorithm,
            encryption: self.encryption,
            zip: self.zip,
            typ: self.typ,
            extra: self.extra,
            registry: self.registry,
            payload: BytesPayload(payload),
            recipient: self.recipient,
        }
    }
}

impl<'a, P, R> JweBuilder<'a, P, R> {
    /// The key management algorithm to use for the content encryption
    /// key.
    #[must_use]
    pub fn key_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// The content encryption algorithm to use for the payload.
    #[must_use]
    pub fn content_algorithm(mut self, encryption: impl Into<String>) -> Self {
        self.encryption = encryption.into();
        self
    }

    /// Compress the payload before encryption (`zip` header).
    #[must_use]
    pub fn zip(mut self, code: impl Into<String>) -> Self {
        self.zip = Some(code.into());
        self
    }

    /// Specify the `typ` header (omitted by default).
    #[must_use]
    pub fn typ(mut self, typ: impl Into<String>) -> Self {
        self.typ = Some(typ.into());
        self
    }

    /// Add a caller-supplied header entry. Registered entries set by the
    /// builder overwrite extras on conflict.
    #[must_use]
    pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name, value);
        self
    }

    /// Resolve algorithms from a caller-supplied registry instead of the
    /// shared standard set.
    #[must_use]
    pub const fn registry(mut self, registry: &'a AlgorithmRegistry) -> Self {
        self.registry = Some(registry);
        self
    }
}

impl<'a, P> JweBuilder<'a, P, NoRecipient> {
    /// Set the recipient's key encryption key.
    #[must_use]
    pub fn recipient<'k>(self, key: &'k SecretKey) -> JweBuilder<'a, P, WithRecipient<'k>> {
        JweBuilder {
            algorithm: self.algorithm,
            encryption: self.encryption,
            zip: self.zip,
            typ: self.typ,
            extra: self.extra,
            registry: self.registry,
            payload: self.payload,
            recipient: WithRecipient(key),
        }
    }
}

impl<P: PayloadBytes> JweBuilder<'_, P, WithRecipient<'_>> {
    /// Generate the encrypted compact serialization.
    ///
    /// # Errors
    ///
    /// As for [`encrypt`]. No partial token is emitted on failure.
    pub fn build(self) -> Result<String> {
        let registry = self.registry.unwrap_or_else(|| AlgorithmRegistry::shared());
        let key_management = registry.key_management(&self.algorithm)?;
        let encryption = registry.content_encryption(&self.encryption)?;
        let compression = self.zip.as_ref().map(|code| registry.compression(code)).transpose()?;
        let kek = self.recipient.0;

        // extras first; registered entries overwrite on conflict
        let mut map = self.extra;
        map.insert("alg", self.algorithm.clone());
        map.insert("enc", self.encryption.clone());
        if let Some(zip) = &self.zip {
            map.insert("zip", zip.as_str());
        }
        if let Some(typ) = &self.typ {
            map.insert("typ", typ.as_str());
        }
        if let Some(kid) = kek.key_id() {
            map.insert("kid", kid);
        }

        // the key management step may add entries (epk, p2s, p2c), so it
        // runs before the header is finalized
        let mut cek = rent(encryption.cek_len());
        let mut encrypted_key =
            vec![0_u8; key_management.encrypted_cek_len(kek.bit_len(), encryption.cek_len())];
        let Some(written) =
            key_management.try_wrap_new(kek, &mut map, &mut cek, &mut encrypted_key)?
        else {
            return Err(Error::configuration("encrypted key buffer sizing"));
        };
        encrypted_key.truncate(written);

        // finalized: the encoded header is the associated data
        let header = Header::from_map(map)?;

        let payload = self.payload.to_bytes()?;
        let plaintext = match compression {
            Some(compression) => {
                let mut compressed = Zeroizing::new(Vec::new());
                compression.compress(&payload, &mut compressed)?;
                compressed
            }
            None => Zeroizing::new(payload.into_owned()),
        };

        let mut iv = vec![0_u8; encryption.nonce_len()];
        OsRng.fill_bytes(&mut iv);
        let mut ciphertext = vec![0_u8; encryption.ciphertext_len(plaintext.len())];
        let mut tag = vec![0_u8; encryption.tag_len()];
        encryption.encrypt(
            &cek,
            &iv,
            &plaintext,
            header.encoded().as_bytes(),
            &mut ciphertext,
            &mut tag,
        )?;

        Ok(format!(
            "{}.{}.{}.{}.{}",
            header.encoded(),
            b64::encode(&encrypted_key),
            b64::encode(&iv),
            b64::encode(&ciphertext),
            b64::encode(&tag)
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PLAINTEXT: &str = "The true sign of intelligence is not knowledge but imagination.";

    #[test]
    fn direct_round_trip() {
        let kek = SecretKey::generate_symmetric(256).expect("should generate");
        let credentials = EncryptionCredentials::new(&kek, "dir", "A256GCM");

        let token = encrypt(&PLAINTEXT, &credentials).expect("should encrypt");
        assert_eq!(token.split('.').count(), 5);
        // direct mode carries an empty encrypted-key segment
        assert!(token.split('.').nth(1).expect("segment").is_empty());

        let jwt: Jwt<String> = decrypt(&token, &kek).expect("should decrypt");
        assert_eq!(jwt.claims, PLAINTEXT);
        assert_eq!(jwt.header.alg(), Some("dir"));
        assert_eq!(jwt.header.enc(), Some("A256GCM"));
    }

    #[test]
    fn ecdh_es_round_trip() {
        let recipient = SecretKey::generate_x25519();

        let token = JweBuilder::new()
            .payload(&PLAINTEXT)
            .recipient(&recipient)
            .build()
            .expect("should encrypt");

        let jwt: Jwt<String> = decrypt(&token, &recipient).expect("should decrypt");
        assert_eq!(jwt.claims, PLAINTEXT);
        assert_eq!(jwt.header.alg(), Some("ECDH-ES"));
        assert!(jwt.header.get("epk").is_some());
    }

    #[test]
    fn ecdh_es_a256kw_with_compression() {
        let recipient = SecretKey::generate_x25519();
        let long_payload = PLAINTEXT.repeat(50);

        let token = JweBuilder::new()
            .key_algorithm("ECDH-ES+A256KW")
            .content_algorithm("A256GCM")
            .zip("DEF")
            .payload(&long_payload)
            .recipient(&recipient)
            .build()
            .expect("should encrypt");

        let jwt: Jwt<String> = decrypt(&token, &recipient).expect("should decrypt");
        assert_eq!(jwt.claims, long_payload);
        assert_eq!(jwt.header.zip(), Some("DEF"));
    }

    #[test]
    fn key_wrap_round_trip() {
        let kek = SecretKey::generate_symmetric(128).expect("should generate");

        let token = JweBuilder::new()
            .key_algorithm("A128KW")
            .content_algorithm("A128CBC-HS256")
            .payload(&PLAINTEXT)
            .recipient(&kek)
            .build()
            .expect("should encrypt");

        let jwt: Jwt<String> = decrypt(&token, &kek).expect("should decrypt");
        assert_eq!(jwt.claims, PLAINTEXT);
    }

    #[test]
    fn password_round_trip() {
        let password = SecretKey::from_password("correct horse battery staple");

        let token = JweBuilder::new()
            .key_algorithm("PBES2-HS256+A128KW")
            .content_algorithm("A128CBC-HS256")
            .payload(&PLAINTEXT)
            .recipient(&password)
            .build()
            .expect("should encrypt");

        let jwt: Jwt<String> = decrypt(&token, &password).expect("should decrypt");
        assert_eq!(jwt.claims, PLAINTEXT);
        assert!(jwt.header.get("p2s").is_some());
        assert!(jwt.header.get("p2c").is_some());

        let wrong = SecretKey::from_password("incorrect zebra battery staple");
        let err = decrypt::<String>(&token, &wrong).expect_err("wrong password");
        assert!(matches!(err, Error::Verification));
    }

    #[test]
    fn rsa_round_trip() {
        let kek = test_keys::rsa_key();

        let token = JweBuilder::new()
            .key_algorithm("RSA-OAEP-256")
            .content_algorithm("A256GCM")
            .payload(&PLAINTEXT)
            .recipient(&kek)
            .build()
            .expect("should encrypt");

        let jwt: Jwt<String> = decrypt(&token, &kek).expect("should decrypt");
        assert_eq!(jwt.claims, PLAINTEXT);
    }

    #[test]
    fn chacha_round_trip() {
        let kek = SecretKey::generate_symmetric(256).expect("should generate");
        let credentials = EncryptionCredentials::new(&kek, "dir", "XC20P");

        let token = encrypt(&PLAINTEXT, &credentials).expect("should encrypt");
        let jwt: Jwt<String> = decrypt(&token, &kek).expect("should decrypt");
        assert_eq!(jwt.claims, PLAINTEXT);
    }

    #[test]
    fn wrong_key_is_generic_verification_failure() {
        let kek = SecretKey::generate_symmetric(256).expect("should generate");
        let other = SecretKey::generate_symmetric(256).expect("should generate");
        let credentials = EncryptionCredentials::new(&kek, "dir", "A256GCM");

        let token = encrypt(&PLAINTEXT, &credentials).expect("should encrypt");
        let err = decrypt::<String>(&token, &other).expect_err("wrong key");
        assert!(matches!(err, Error::Verification));
    }

    #[test]
    fn tampered_segments_rejected() {
        let kek = SecretKey::generate_symmetric(256).expect("should generate");
        let credentials = EncryptionCredentials::new(&kek, "dir", "A256GCM");
        let token = encrypt(&PLAINTEXT, &credentials).expect("should encrypt");
        let parts: Vec<&str> = token.split('.').collect();

        // tamper with the ciphertext
        let mut ciphertext = b64::decode(parts[3]).expect("should decode");
        ciphertext[0] ^= 1;
        let forged = format!(
            "{}.{}.{}.{}.{}",
            parts[0],
            parts[1],
            parts[2],
            b64::encode(&ciphertext),
            parts[4]
        );
        assert!(matches!(decrypt::<String>(&forged, &kek), Err(Error::Verification)));

        // tamper with the authentication tag
        let mut tag = b64::decode(parts[4]).expect("should decode");
        tag[0] ^= 1;
        let forged =
            format!("{}.{}.{}.{}.{}", parts[0], parts[1], parts[2], parts[3], b64::encode(&tag));
        assert!(matches!(decrypt::<String>(&forged, &kek), Err(Error::Verification)));
    }

    #[test]
    fn unknown_algorithms_unsupported() {
        let kek = SecretKey::generate_symmetric(256).expect("should generate");
        let credentials = EncryptionCredentials::new(&kek, "dir", "A999GCM");
        assert!(matches!(encrypt(&PLAINTEXT, &credentials), Err(Error::UnsupportedAlgorithm(_))));

        let credentials = EncryptionCredentials::new(&kek, "KRYPTONITE", "A256GCM");
        assert!(matches!(encrypt(&PLAINTEXT, &credentials), Err(Error::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn wrong_segment_count_is_format_error() {
        let kek = SecretKey::generate_symmetric(256).expect("should generate");
        assert!(matches!(decrypt::<String>("a.b.c.d", &kek), Err(Error::Format(_))));
    }
}
