//! # Secret Keys
//!
//! Typed wrappers around symmetric and asymmetric key material, plus the
//! metadata (key id, intended use, bound algorithm, expiry) a key store
//! attaches to them. The engine borrows a [`SecretKey`] read-only for the
//! duration of a single operation; ownership stays with whichever
//! collaborator constructed it.
//!
//! Every factory validates what it is given and signals
//! [`Error::KeyValidation`] rather than silently coercing. Symmetric
//! material is erased on drop.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Metadata describing a key's identity and intended use.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyMetadata {
    /// Key identifier, surfaced as the `kid` header when present.
    pub key_id: Option<String>,

    /// Intended use (`sig` or `enc`).
    pub key_use: Option<String>,

    /// Algorithm code the key is bound to; decoding enforces a match when
    /// set, closing the algorithm-substitution hole.
    pub algorithm: Option<String>,

    /// Instant after which the key must no longer be used.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Cryptographic key material plus metadata.
///
/// Construct through the typed factories; the material variant is not
/// exposed directly. Accessors return [`Error::KeyValidation`] when the
/// key does not match the requested shape.
#[derive(Clone)]
pub struct SecretKey {
    material: KeyMaterial,
    metadata: KeyMetadata,
}

#[derive(Clone)]
enum KeyMaterial {
    Symmetric(Zeroizing<Vec<u8>>),
    Rsa(Box<RsaMaterial>),
    P256(Box<P256Material>),
    K256(Box<K256Material>),
    Ed25519(Box<Ed25519Material>),
    X25519(Box<X25519Material>),
}

#[derive(Clone)]
struct RsaMaterial {
    private: Option<rsa::RsaPrivateKey>,
    public: rsa::RsaPublicKey,
}

#[derive(Clone)]
struct P256Material {
    private: Option<p256::ecdsa::SigningKey>,
    public: p256::ecdsa::VerifyingKey,
}

#[derive(Clone)]
struct K256Material {
    private: Option<k256::ecdsa::SigningKey>,
    public: k256::ecdsa::VerifyingKey,
}

#[derive(Clone)]
struct Ed25519Material {
    private: Option<ed25519_dalek::SigningKey>,
    public: ed25519_dalek::VerifyingKey,
}

#[derive(Clone)]
struct X25519Material {
    private: Option<x25519_dalek::StaticSecret>,
    public: x25519_dalek::PublicKey,
}

impl SecretKey {
    // ----------------
    // Factories
    // ----------------

    /// Wrap raw symmetric secret bytes.
    #[must_use]
    pub fn from_symmetric(secret: impl Into<Vec<u8>>) -> Self {
        Self::new(KeyMaterial::Symmetric(Zeroizing::new(secret.into())))
    }

    /// Wrap a UTF-8 password as symmetric material (PBES2 key management).
    #[must_use]
    pub fn from_password(password: &str) -> Self {
        Self::from_symmetric(password.as_bytes().to_vec())
    }

    /// Generate fresh random symmetric material of the given bit length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when `bits` is zero or not a
    /// multiple of 8.
    pub fn generate_symmetric(bits: u32) -> Result<Self> {
        if bits == 0 || bits % 8 != 0 {
            return Err(Error::key_validation(format!(
                "symmetric key size must be a positive multiple of 8 bits, got {bits}"
            )));
        }
        let mut secret = Zeroizing::new(vec![0_u8; bits as usize / 8]);
        rand::RngCore::fill_bytes(&mut OsRng, &mut secret[..]);
        Ok(Self::new(KeyMaterial::Symmetric(secret)))
    }

    /// Generate a fresh RSA key pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when `bits` is below 2048 or key
    /// generation fails.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        if bits < 2048 {
            return Err(Error::key_validation(format!(
                "RSA keys below 2048 bits are not accepted, got {bits}"
            )));
        }
        let private = rsa::RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| Error::key_validation(format!("RSA key generation: {e}")))?;
        let public = private.to_public_key();
        Ok(Self::new(KeyMaterial::Rsa(Box::new(RsaMaterial {
            private: Some(private),
            public,
        }))))
    }

    /// Import an RSA private key from PKCS#8 PEM.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the PEM does not parse or the
    /// modulus is below 2048 bits.
    pub fn from_rsa_pkcs8_pem(pem: &str) -> Result<Self> {
        let private = rsa::RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::key_validation(format!("invalid RSA PKCS#8 PEM: {e}")))?;
        Self::from_rsa_private(private)
    }

    /// Import an RSA private key from PKCS#8 DER.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the DER does not parse or the
    /// modulus is below 2048 bits.
    pub fn from_rsa_pkcs8_der(der: &[u8]) -> Result<Self> {
        let private = rsa::RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| Error::key_validation(format!("invalid RSA PKCS#8 DER: {e}")))?;
        Self::from_rsa_private(private)
    }

    /// Import an RSA public key from SPKI PEM, for verify/wrap-only use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the PEM does not parse or the
    /// modulus is below 2048 bits.
    pub fn from_rsa_public_pem(pem: &str) -> Result<Self> {
        let public = rsa::RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| Error::key_validation(format!("invalid RSA public key PEM: {e}")))?;
        if public.size() * 8 < 2048 {
            return Err(Error::key_validation("RSA keys below 2048 bits are not accepted"));
        }
        Ok(Self::new(KeyMaterial::Rsa(Box::new(RsaMaterial { private: None, public }))))
    }

    fn from_rsa_private(private: rsa::RsaPrivateKey) -> Result<Self> {
        if private.size() * 8 < 2048 {
            return Err(Error::key_validation("RSA keys below 2048 bits are not accepted"));
        }
        let public = private.to_public_key();
        Ok(Self::new(KeyMaterial::Rsa(Box::new(RsaMaterial {
            private: Some(private),
            public,
        }))))
    }

    /// Generate a fresh P-256 signing key pair.
    #[must_use]
    pub fn generate_p256() -> Self {
        let private = p256::ecdsa::SigningKey::random(&mut OsRng);
        let public = *private.verifying_key();
        Self::new(KeyMaterial::P256(Box::new(P256Material {
            private: Some(private),
            public,
        })))
    }

    /// Import a P-256 private key from PKCS#8 PEM.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the PEM does not parse as a
    /// P-256 key.
    pub fn from_p256_pkcs8_pem(pem: &str) -> Result<Self> {
        let secret = p256::SecretKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::key_validation(format!("invalid P-256 PKCS#8 PEM: {e}")))?;
        let private = p256::ecdsa::SigningKey::from(&secret);
        let public = *private.verifying_key();
        Ok(Self::new(KeyMaterial::P256(Box::new(P256Material {
            private: Some(private),
            public,
        }))))
    }

    /// Generate a fresh secp256k1 signing key pair.
    #[must_use]
    pub fn generate_k256() -> Self {
        let private = k256::ecdsa::SigningKey::random(&mut OsRng);
        let public = *private.verifying_key();
        Self::new(KeyMaterial::K256(Box::new(K256Material {
            private: Some(private),
            public,
        })))
    }

    /// Generate a fresh Ed25519 signing key pair.
    #[must_use]
    pub fn generate_ed25519() -> Self {
        let private = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let public = private.verifying_key();
        Self::new(KeyMaterial::Ed25519(Box::new(Ed25519Material {
            private: Some(private),
            public,
        })))
    }

    /// Import an Ed25519 signing key from its 32-byte seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when `seed` is not 32 bytes.
    pub fn from_ed25519_seed(seed: &[u8]) -> Result<Self> {
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| Error::key_validation("Ed25519 seed must be 32 bytes"))?;
        let private = ed25519_dalek::SigningKey::from_bytes(&seed);
        let public = private.verifying_key();
        Ok(Self::new(KeyMaterial::Ed25519(Box::new(Ed25519Material {
            private: Some(private),
            public,
        }))))
    }

    /// Generate a fresh X25519 key-agreement pair.
    #[must_use]
    pub fn generate_x25519() -> Self {
        let private = x25519_dalek::StaticSecret::random_from_rng(OsRng);
        let public = x25519_dalek::PublicKey::from(&private);
        Self::new(KeyMaterial::X25519(Box::new(X25519Material {
            private: Some(private),
            public,
        })))
    }

    /// Import an X25519 secret from its 32-byte scalar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when `secret` is not 32 bytes.
    pub fn from_x25519_secret(secret: &[u8]) -> Result<Self> {
        let secret: [u8; 32] = secret
            .try_into()
            .map_err(|_| Error::key_validation("X25519 secret must be 32 bytes"))?;
        let private = x25519_dalek::StaticSecret::from(secret);
        let public = x25519_dalek::PublicKey::from(&private);
        Ok(Self::new(KeyMaterial::X25519(Box::new(X25519Material {
            private: Some(private),
            public,
        }))))
    }

    /// Import an X25519 public key, for wrap-only (sender-side) use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when `public` is not 32 bytes.
    pub fn from_x25519_public(public: &[u8]) -> Result<Self> {
        let public: [u8; 32] = public
            .try_into()
            .map_err(|_| Error::key_validation("X25519 public key must be 32 bytes"))?;
        Ok(Self::new(KeyMaterial::X25519(Box::new(X25519Material {
            private: None,
            public: x25519_dalek::PublicKey::from(public),
        }))))
    }

    const fn new(material: KeyMaterial) -> Self {
        Self {
            material,
            metadata: KeyMetadata {
                key_id: None,
                key_use: None,
                algorithm: None,
                expires_at: None,
            },
        }
    }

    // ----------------
    // Metadata
    // ----------------

    /// Attach a key id (`kid`).
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.metadata.key_id = Some(key_id.into());
        self
    }

    /// Attach an intended use (`sig` or `enc`).
    #[must_use]
    pub fn with_use(mut self, key_use: impl Into<String>) -> Self {
        self.metadata.key_use = Some(key_use.into());
        self
    }

    /// Bind the key to an algorithm code.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.metadata.algorithm = Some(algorithm.into());
        self
    }

    /// Attach an expiry instant.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.metadata.expires_at = Some(expires_at);
        self
    }

    /// Replace the whole metadata block.
    #[must_use]
    pub fn with_metadata(mut self, metadata: KeyMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The key's metadata.
    #[must_use]
    pub const fn metadata(&self) -> &KeyMetadata {
        &self.metadata
    }

    /// The key id, if set.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.metadata.key_id.as_deref()
    }

    /// Whether the key's expiry instant has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.metadata.expires_at.is_some_and(|at| at < Utc::now())
    }

    // ----------------
    // Shape and size
    // ----------------

    /// The key size in bits: the secret length for symmetric keys, the
    /// modulus size for RSA, the curve size otherwise.
    #[must_use]
    pub fn bit_len(&self) -> u32 {
        match &self.material {
            KeyMaterial::Symmetric(secret) => u32::try_from(secret.len()).unwrap_or(u32::MAX) * 8,
            KeyMaterial::Rsa(rsa) => u32::try_from(rsa.public.size()).unwrap_or(u32::MAX) * 8,
            KeyMaterial::P256(_)
            | KeyMaterial::K256(_)
            | KeyMaterial::Ed25519(_)
            | KeyMaterial::X25519(_) => 256,
        }
    }

    /// Whether this is a symmetric key.
    #[must_use]
    pub const fn is_symmetric(&self) -> bool {
        matches!(self.material, KeyMaterial::Symmetric(_))
    }

    // ----------------
    // Typed accessors (pure reads; error on shape mismatch)
    // ----------------

    /// The raw symmetric secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not symmetric.
    pub fn symmetric(&self) -> Result<&[u8]> {
        match &self.material {
            KeyMaterial::Symmetric(secret) => Ok(secret),
            _ => Err(Error::key_validation("symmetric key material required")),
        }
    }

    /// The symmetric secret, validated against an algorithm's legal bit
    /// sizes. A length at the exact boundary of a legal range passes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not symmetric or
    /// its bit length is outside every legal range.
    pub fn ensure_symmetric_bits(&self, legal: &[RangeInclusive<u32>]) -> Result<&[u8]> {
        let secret = self.symmetric()?;
        ensure_bit_len(u32::try_from(secret.len()).unwrap_or(u32::MAX) * 8, legal)?;
        Ok(secret)
    }

    /// The RSA public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not RSA.
    pub fn rsa_public(&self) -> Result<&rsa::RsaPublicKey> {
        match &self.material {
            KeyMaterial::Rsa(rsa) => Ok(&rsa.public),
            _ => Err(Error::key_validation("RSA key material required")),
        }
    }

    /// The RSA private key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not RSA or carries
    /// no private part.
    pub fn rsa_private(&self) -> Result<&rsa::RsaPrivateKey> {
        match &self.material {
            KeyMaterial::Rsa(rsa) => rsa
                .private
                .as_ref()
                .ok_or_else(|| Error::key_validation("RSA private key required")),
            _ => Err(Error::key_validation("RSA key material required")),
        }
    }

    /// The P-256 signing key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not P-256 or
    /// carries no private part.
    pub fn p256_signing(&self) -> Result<&p256::ecdsa::SigningKey> {
        match &self.material {
            KeyMaterial::P256(ec) => ec
                .private
                .as_ref()
                .ok_or_else(|| Error::key_validation("P-256 private key required")),
            _ => Err(Error::key_validation("P-256 key material required")),
        }
    }

    /// The P-256 verifying key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not P-256.
    pub fn p256_verifying(&self) -> Result<&p256::ecdsa::VerifyingKey> {
        match &self.material {
            KeyMaterial::P256(ec) => Ok(&ec.public),
            _ => Err(Error::key_validation("P-256 key material required")),
        }
    }

    /// The secp256k1 signing key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not secp256k1 or
    /// carries no private part.
    pub fn k256_signing(&self) -> Result<&k256::ecdsa::SigningKey> {
        match &self.material {
            KeyMaterial::K256(ec) => ec
                .private
                .as_ref()
                .ok_or_else(|| Error::key_validation("secp256k1 private key required")),
            _ => Err(Error::key_validation("secp256k1 key material required")),
        }
    }

    /// The secp256k1 verifying key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not secp256k1.
    pub fn k256_verifying(&self) -> Result<&k256::ecdsa::VerifyingKey> {
        match &self.material {
            KeyMaterial::K256(ec) => Ok(&ec.public),
            _ => Err(Error::key_validation("secp256k1 key material required")),
        }
    }

    /// The Ed25519 signing key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not Ed25519 or
    /// carries no private part.
    pub fn ed25519_signing(&self) -> Result<&ed25519_dalek::SigningKey> {
        match &self.material {
            KeyMaterial::Ed25519(ed) => ed
                .private
                .as_ref()
                .ok_or_else(|| Error::key_validation("Ed25519 private key required")),
            _ => Err(Error::key_validation("Ed25519 key material required")),
        }
    }

    /// The Ed25519 verifying key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not Ed25519.
    pub fn ed25519_verifying(&self) -> Result<&ed25519_dalek::VerifyingKey> {
        match &self.material {
            KeyMaterial::Ed25519(ed) => Ok(&ed.public),
            _ => Err(Error::key_validation("Ed25519 key material required")),
        }
    }

    /// The X25519 static secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not X25519 or
    /// carries no private part.
    pub fn x25519_secret(&self) -> Result<&x25519_dalek::StaticSecret> {
        match &self.material {
            KeyMaterial::X25519(x) => x
                .private
                .as_ref()
                .ok_or_else(|| Error::key_validation("X25519 secret required")),
            _ => Err(Error::key_validation("X25519 key material required")),
        }
    }

    /// The X25519 public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyValidation`] when the key is not X25519.
    pub fn x25519_public(&self) -> Result<&x25519_dalek::PublicKey> {
        match &self.material {
            KeyMaterial::X25519(x) => Ok(&x.public),
            _ => Err(Error::key_validation("X25519 key material required")),
        }
    }
}

impl std::fmt::Debug for SecretKey {
    // never print key material
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.material {
            KeyMaterial::Symmetric(_) => "Symmetric",
            KeyMaterial::Rsa(_) => "Rsa",
            KeyMaterial::P256(_) => "P256",
            KeyMaterial::K256(_) => "K256",
            KeyMaterial::Ed25519(_) => "Ed25519",
            KeyMaterial::X25519(_) => "X25519",
        };
        f.debug_struct("SecretKey")
            .field("kind", &kind)
            .field("bits", &self.bit_len())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Validate a bit length against a set of legal inclusive ranges.
///
/// # Errors
///
/// Returns [`Error::KeyValidation`] when `actual` falls outside every
/// range.
pub fn ensure_bit_len(actual: u32, legal: &[RangeInclusive<u32>]) -> Result<()> {
    if legal.iter().any(|range| range.contains(&actual)) {
        return Ok(());
    }
    Err(Error::key_validation(format!("key size {actual} bits is outside the legal sizes")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn symmetric_bits() {
        let key = SecretKey::from_symmetric(vec![0_u8; 32]);
        assert_eq!(key.bit_len(), 256);
        assert!(key.is_symmetric());
        assert!(key.symmetric().is_ok());
        assert!(key.rsa_public().is_err());
    }

    #[test]
    fn boundary_sizes() {
        let key = SecretKey::from_symmetric(vec![0_u8; 32]);
        // exact lower boundary passes
        assert!(key.ensure_symmetric_bits(&[256..=512]).is_ok());
        // exact upper boundary passes
        assert!(key.ensure_symmetric_bits(&[128..=256]).is_ok());
        // one bit short of the range fails
        assert!(key.ensure_symmetric_bits(&[264..=512]).is_err());
    }

    #[test]
    fn generate_validates_size() {
        assert!(SecretKey::generate_symmetric(0).is_err());
        assert!(SecretKey::generate_symmetric(130).is_err());
        let key = SecretKey::generate_symmetric(128).expect("should generate");
        assert_eq!(key.bit_len(), 128);
    }

    #[test]
    fn metadata_flows() {
        let key = SecretKey::from_symmetric(vec![0_u8; 32])
            .with_key_id("k1")
            .with_use("sig")
            .with_algorithm("HS256");
        assert_eq!(key.key_id(), Some("k1"));
        assert_eq!(key.metadata().algorithm.as_deref(), Some("HS256"));
        assert!(!key.is_expired());
    }

    #[test]
    fn public_only_has_no_private() {
        let pair = SecretKey::generate_x25519();
        let public = pair.x25519_public().expect("should read public");
        let wrap_only =
            SecretKey::from_x25519_public(public.as_bytes()).expect("should import public");
        assert!(wrap_only.x25519_public().is_ok());
        assert!(wrap_only.x25519_secret().is_err());
    }

    #[test]
    fn debug_redacts_material() {
        let key = SecretKey::from_symmetric(vec![0xaa_u8; 32]).with_key_id("k1");
        let printed = format!("{key:?}");
        assert!(!printed.contains("aa"));
        assert!(printed.contains("Symmetric"));
    }
}
