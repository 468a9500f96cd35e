//! # Algorithm Registry
//!
//! Resolves `(family, code)` pairs to shared algorithm instances. The
//! registry is built once — duplicate registrations are a configuration
//! error caught at build time, not at lookup time — and served immutably
//! afterwards, so lookups need no locking.
//!
//! Codes the registry does not know surface as
//! [`Error::UnsupportedAlgorithm`]; forward compatibility is a matter of
//! registering another strategy, never of editing dispatch sites.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::aead::{
    A128CbcHs256, A128Gcm, A192CbcHs384, A192Gcm, A256CbcHs512, A256Gcm,
    ContentEncryptionAlgorithm, XC20P,
};
use crate::error::{Error, Result};
use crate::keywrap::{
    A128Kw, A192Kw, A256Kw, Dir, EcdhEs, EcdhEsA128Kw, EcdhEsA256Kw, KeyManagementAlgorithm,
    Pbes2Hs256A128Kw, Pbes2Hs384A192Kw, Pbes2Hs512A256Kw, Rsa15, RsaOaep, RsaOaep256,
};
use crate::sig::{EdDsa, Es256, Es256K, Hs256, Hs384, Hs512, Ps256, Rs256, Rs384, Rs512, SignatureAlgorithm};
use crate::zip::{CompressionAlgorithm, Deflate};

/// Immutable algorithm lookup, keyed by code within each family.
#[derive(Default)]
pub struct AlgorithmRegistry {
    signature: HashMap<&'static str, Arc<dyn SignatureAlgorithm>>,
    key_management: HashMap<&'static str, Arc<dyn KeyManagementAlgorithm>>,
    content_encryption: HashMap<&'static str, Arc<dyn ContentEncryptionAlgorithm>>,
    compression: HashMap<&'static str, Arc<dyn CompressionAlgorithm>>,
}

impl AlgorithmRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The full built-in algorithm set.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::default();

        registry.signature.insert("HS256", Arc::new(Hs256));
        registry.signature.insert("HS384", Arc::new(Hs384));
        registry.signature.insert("HS512", Arc::new(Hs512));
        registry.signature.insert("RS256", Arc::new(Rs256));
        registry.signature.insert("RS384", Arc::new(Rs384));
        registry.signature.insert("RS512", Arc::new(Rs512));
        registry.signature.insert("PS256", Arc::new(Ps256));
        registry.signature.insert("ES256", Arc::new(Es256));
        registry.signature.insert("ES256K", Arc::new(Es256K));
        registry.signature.insert("EdDSA", Arc::new(EdDsa));

        registry.key_management.insert("dir", Arc::new(Dir));
        registry.key_management.insert("A128KW", Arc::new(A128Kw));
        registry.key_management.insert("A192KW", Arc::new(A192Kw));
        registry.key_management.insert("A256KW", Arc::new(A256Kw));
        registry.key_management.insert("RSA1_5", Arc::new(Rsa15));
        registry.key_management.insert("RSA-OAEP", Arc::new(RsaOaep));
        registry.key_management.insert("RSA-OAEP-256", Arc::new(RsaOaep256));
        registry.key_management.insert("ECDH-ES", Arc::new(EcdhEs));
        registry.key_management.insert("ECDH-ES+A128KW", Arc::new(EcdhEsA128Kw));
        registry.key_management.insert("ECDH-ES+A256KW", Arc::new(EcdhEsA256Kw));
        registry.key_management.insert("PBES2-HS256+A128KW", Arc::new(Pbes2Hs256A128Kw));
        registry.key_management.insert("PBES2-HS384+A192KW", Arc::new(Pbes2Hs384A192Kw));
        registry.key_management.insert("PBES2-HS512+A256KW", Arc::new(Pbes2Hs512A256Kw));

        registry.content_encryption.insert("A128GCM", Arc::new(A128Gcm));
        registry.content_encryption.insert("A192GCM", Arc::new(A192Gcm));
        registry.content_encryption.insert("A256GCM", Arc::new(A256Gcm));
        registry.content_encryption.insert("A128CBC-HS256", Arc::new(A128CbcHs256));
        registry.content_encryption.insert("A192CBC-HS384", Arc::new(A192CbcHs384));
        registry.content_encryption.insert("A256CBC-HS512", Arc::new(A256CbcHs512));
        registry.content_encryption.insert("XC20P", Arc::new(XC20P));

        registry.compression.insert("DEF", Arc::new(Deflate));

        registry
    }

    /// The process-wide shared standard registry.
    #[must_use]
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<AlgorithmRegistry> = OnceLock::new();
        SHARED.get_or_init(Self::standard)
    }

    /// Look up a signature algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] when the code is unknown.
    pub fn signature(&self, code: &str) -> Result<&Arc<dyn SignatureAlgorithm>> {
        self.try_signature(code).ok_or_else(|| Error::UnsupportedAlgorithm(code.into()))
    }

    /// Look up a signature algorithm, returning `None` when unknown.
    #[must_use]
    pub fn try_signature(&self, code: &str) -> Option<&Arc<dyn SignatureAlgorithm>> {
        self.signature.get(code)
    }

    /// Look up a key management algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] when the code is unknown.
    pub fn key_management(&self, code: &str) -> Result<&Arc<dyn KeyManagementAlgorithm>> {
        self.try_key_management(code).ok_or_else(|| Error::UnsupportedAlgorithm(code.into()))
    }

    /// Look up a key management algorithm, returning `None` when unknown.
    #[must_use]
    pub fn try_key_management(&self, code: &str) -> Option<&Arc<dyn KeyManagementAlgorithm>> {
        self.key_management.get(code)
    }

    /// Look up a content encryption algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] when the code is unknown.
    pub fn content_encryption(&self, code: &str) -> Result<&Arc<dyn ContentEncryptionAlgorithm>> {
        self.try_content_encryption(code)
            .ok_or_else(|| Error::UnsupportedAlgorithm(code.into()))
    }

    /// Look up a content encryption algorithm, returning `None` when
    /// unknown.
    #[must_use]
    pub fn try_content_encryption(
        &self, code: &str,
    ) -> Option<&Arc<dyn ContentEncryptionAlgorithm>> {
        self.content_encryption.get(code)
    }

    /// Look up a compression algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] when the code is unknown.
    pub fn compression(&self, code: &str) -> Result<&Arc<dyn CompressionAlgorithm>> {
        self.try_compression(code).ok_or_else(|| Error::UnsupportedAlgorithm(code.into()))
    }

    /// Look up a compression algorithm, returning `None` when unknown.
    #[must_use]
    pub fn try_compression(&self, code: &str) -> Option<&Arc<dyn CompressionAlgorithm>> {
        self.compression.get(code)
    }
}

/// Collects registrations and checks them for duplicates at build time.
#[derive(Default)]
pub struct RegistryBuilder {
    signature: Vec<Arc<dyn SignatureAlgorithm>>,
    key_management: Vec<Arc<dyn KeyManagementAlgorithm>>,
    content_encryption: Vec<Arc<dyn ContentEncryptionAlgorithm>>,
    compression: Vec<Arc<dyn CompressionAlgorithm>>,
}

impl RegistryBuilder {
    /// Register a signature algorithm.
    #[must_use]
    pub fn signature(mut self, algorithm: impl SignatureAlgorithm + 'static) -> Self {
        self.signature.push(Arc::new(algorithm));
        self
    }

    /// Register a key management algorithm.
    #[must_use]
    pub fn key_management(mut self, algorithm: impl KeyManagementAlgorithm + 'static) -> Self {
        self.key_management.push(Arc::new(algorithm));
        self
    }

    /// Register a content encryption algorithm.
    #[must_use]
    pub fn content_encryption(
        mut self, algorithm: impl ContentEncryptionAlgorithm + 'static,
    ) -> Self {
        self.content_encryption.push(Arc::new(algorithm));
        self
    }

    /// Register a compression algorithm.
    #[must_use]
    pub fn compression(mut self, algorithm: impl CompressionAlgorithm + 'static) -> Self {
        self.compression.push(Arc::new(algorithm));
        self
    }

    /// Build the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when two algorithms in the same
    /// family share a code.
    pub fn build(self) -> Result<AlgorithmRegistry> {
        let mut registry = AlgorithmRegistry::default();

        for algorithm in self.signature {
            let code = algorithm.code();
            if registry.signature.insert(code, algorithm).is_some() {
                return Err(duplicate("signature", code));
            }
        }
        for algorithm in self.key_management {
            let code = algorithm.code();
            if registry.key_management.insert(code, algorithm).is_some() {
                return Err(duplicate("key management", code));
            }
        }
        for algorithm in self.content_encryption {
            let code = algorithm.code();
            if registry.content_encryption.insert(code, algorithm).is_some() {
                return Err(duplicate("content encryption", code));
            }
        }
        for algorithm in self.compression {
            let code = algorithm.code();
            if registry.compression.insert(code, algorithm).is_some() {
                return Err(duplicate("compression", code));
            }
        }

        Ok(registry)
    }
}

fn duplicate(family: &str, code: &str) -> Error {
    Error::configuration(format!("duplicate {family} algorithm registration for `{code}`"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_set_resolves() {
        let registry = AlgorithmRegistry::standard();
        assert!(registry.signature("HS256").is_ok());
        assert!(registry.signature("ES256").is_ok());
        assert!(registry.key_management("ECDH-ES+A256KW").is_ok());
        assert!(registry.content_encryption("A128CBC-HS256").is_ok());
        assert!(registry.compression("DEF").is_ok());
    }

    #[test]
    fn unknown_code_is_unsupported() {
        let registry = AlgorithmRegistry::standard();
        let Err(err) = registry.signature("HS1024") else {
            panic!("unknown code");
        };
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
        // families are independent namespaces
        assert!(registry.signature("A128GCM").is_err());
    }

    #[test]
    fn duplicate_registration_rejected_at_build() {
        let result = AlgorithmRegistry::builder()
            .signature(crate::sig::Hs256)
            .signature(crate::sig::Hs256)
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn custom_build_resolves() {
        let registry = AlgorithmRegistry::builder()
            .signature(crate::sig::Hs256)
            .key_management(crate::keywrap::Dir)
            .content_encryption(crate::aead::A256Gcm)
            .build()
            .expect("should build");
        assert!(registry.signature("HS256").is_ok());
        assert!(registry.signature("HS384").is_err());
    }
}
