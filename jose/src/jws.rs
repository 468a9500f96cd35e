//! # JSON Web Signature (JWS)
//!
//! JWS ([RFC7515]) represents content secured with digital signatures or
//! MACs using the compact serialization: three base64url segments —
//! protected header, payload, signature — joined by `.`. The signing
//! input is the encoded header and encoded payload joined by `.`, which
//! holds for detached content too ([RFC7515] appendix F): a detached
//! token simply omits the payload segment from the wire.
//!
//! Verification failures are deliberately uniform: a bad signature, a
//! substituted algorithm, and a wrong key all surface as
//! [`Error::Verification`] with no further detail.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515

use std::borrow::Cow;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sigil_crypto::{AlgorithmRegistry, Error, HeaderMap, Result, SecretKey, b64};

use crate::header::Header;
use crate::jwt::Jwt;
use crate::token::Compact;

/// Signing credentials: a borrowed key plus the signature algorithm code
/// to run it under.
pub struct SigningCredentials<'a> {
    /// The signing key; borrowed read-only for the duration of a call.
    pub key: &'a SecretKey,

    /// Signature algorithm code (`HS256`, `ES256`, ...).
    pub algorithm: String,
}

impl<'a> SigningCredentials<'a> {
    /// Pair a key with an explicit algorithm code.
    pub fn new(key: &'a SecretKey, algorithm: impl Into<String>) -> Self {
        Self { key, algorithm: algorithm.into() }
    }

    /// Use the algorithm the key's metadata binds it to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the key carries no algorithm.
    pub fn from_key(key: &'a SecretKey) -> Result<Self> {
        let algorithm = key
            .metadata()
            .algorithm
            .clone()
            .ok_or_else(|| Error::configuration("key metadata names no algorithm"))?;
        Ok(Self { key, algorithm })
    }
}

/// Encode the payload as a signed compact JWS.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAlgorithm`] for an unknown algorithm code,
/// [`Error::KeyValidation`] for a key the algorithm rejects, and
/// [`Error::Format`] when the payload cannot be serialized. Nothing is
/// emitted on failure.
pub fn encode<T>(payload: &T, credentials: &SigningCredentials<'_>) -> Result<String>
where
    T: Serialize,
{
    tracing::debug!("encode");
    JwsBuilder::new().payload(payload).signer(credentials).build()
}

/// Decode a compact JWS, verify its signature, and deserialize the
/// claims.
///
/// # Errors
///
/// Returns [`Error::Format`] for a malformed token,
/// [`Error::UnsupportedAlgorithm`] for an unregistered `alg`, and
/// [`Error::Verification`] when the signature does not check out.
pub fn decode<T>(token: &str, key: &SecretKey) -> Result<Jwt<T>>
where
    T: DeserializeOwned,
{
    tracing::debug!("decode");

    let (header, payload) = verify_bytes(token, key)?;
    let claims = serde_json::from_slice(&payload)
        .map_err(|e| Error::format(format!("issue deserializing claims: {e}")))?;
    Ok(Jwt { header, claims })
}

/// Decode and verify a compact JWS, returning the raw payload bytes.
///
/// # Errors
///
/// As for [`decode`].
pub fn verify_bytes(token: &str, key: &SecretKey) -> Result<(Header, Vec<u8>)> {
    verify_bytes_with(token, key, AlgorithmRegistry::shared())
}

/// [`verify_bytes`] against a caller-supplied registry.
///
/// # Errors
///
/// As for [`decode`].
pub fn verify_bytes_with(
    token: &str, key: &SecretKey, registry: &AlgorithmRegistry,
) -> Result<(Header, Vec<u8>)> {
    let jws = token.parse::<Compact>()?.into_jws()?;
    verify_signature(&jws.header, &jws.payload, &jws.signature, key, registry)?;

    let payload = b64::decode(&jws.payload)?;
    Ok((jws.header, payload))
}

/// Verify a detached-content JWS ([RFC7515] appendix F) against the
/// caller-supplied payload bytes.
///
/// # Errors
///
/// As for [`decode`]; additionally [`Error::Format`] when the token
/// embeds a payload after all.
///
/// [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
pub fn verify_detached(token: &str, payload: &[u8], key: &SecretKey) -> Result<Header> {
    verify_detached_with(token, payload, key, AlgorithmRegistry::shared())
}

/// [`verify_detached`] against a caller-supplied registry.
///
/// # Errors
///
/// As for [`verify_detached`].
pub fn verify_detached_with(
    token: &str, payload: &[u8], key: &SecretKey, registry: &AlgorithmRegistry,
) -> Result<Header> {
    tracing::debug!("verify_detached");

    let jws = token.parse::<Compact>()?.into_jws()?;
    if !jws.payload.is_empty() {
        return Err(Error::format("detached JWS must not embed a payload"));
    }

    let encoded_payload = b64::encode(payload);
    verify_signature(&jws.header, &encoded_payload, &jws.signature, key, registry)?;
    Ok(jws.header)
}

// Shared verification path. The signing input is rebuilt from the
// verbatim header segment, so whitespace or member order in the header
// can never diverge from what was signed.
fn verify_signature(
    header: &Header, encoded_payload: &str, encoded_signature: &str, key: &SecretKey,
    registry: &AlgorithmRegistry,
) -> Result<()> {
    reject_critical_extensions(header)?;

    let alg = header.alg().ok_or_else(|| Error::format("missing `alg` header entry"))?;
    let algorithm = registry.signature(alg)?;

    // a key bound to one algorithm must not verify under another
    if let Some(bound) = &key.metadata().algorithm
        && bound != alg
    {
        return Err(Error::Verification);
    }

    let signature = b64::decode(encoded_signature)?;
    let signing_input = format!("{}.{}", header.encoded(), encoded_payload);
    if algorithm.verify(key, signing_input.as_bytes(), &signature)? {
        Ok(())
    } else {
        Err(Error::Verification)
    }
}

pub(crate) fn reject_critical_extensions(header: &Header) -> Result<()> {
    match header.crit() {
        None => Ok(()),
        Some(Value::Array(entries)) if entries.is_empty() => Ok(()),
        Some(value) => Err(Error::UnsupportedAlgorithm(format!("crit extensions {value}"))),
    }
}

/// Builds a signed compact JWS from a payload and signing credentials.
pub struct JwsBuilder<'a, P, S> {
    typ: String,
    extra: HeaderMap,
    detached: bool,
    registry: Option<&'a AlgorithmRegistry>,
    payload: P,
    signer: S,
}

#[doc(hidden)]
/// Typestate generic for a builder with no payload.
pub struct NoPayload;
#[doc(hidden)]
/// Typestate generic for a builder with a serializable payload.
pub struct Payload<'p, T: Serialize>(pub(crate) &'p T);
#[doc(hidden)]
/// Typestate generic for a builder with a raw byte payload.
pub struct BytesPayload<'p>(pub(crate) &'p [u8]);

#[doc(hidden)]
/// Typestate generic for a JWS builder with no signer.
pub struct NoSigner;
#[doc(hidden)]
/// Typestate generic for a JWS builder with a signer.
pub struct WithSigner<'s, 'k>(&'s SigningCredentials<'k>);

mod sealed {
    use super::{BytesPayload, Payload, Serialize};

    pub trait Sealed {}
    impl<T: Serialize> Sealed for Payload<'_, T> {}
    impl Sealed for BytesPayload<'_> {}
}

/// Payload sources the JWS/JWE builders accept. Sealed; implemented by
/// the builder typestates only.
pub trait PayloadBytes: sealed::Sealed {
    #[doc(hidden)]
    fn to_bytes(&self) -> Result<Cow<'_, [u8]>>;
}

impl<T: Serialize> PayloadBytes for Payload<'_, T> {
    fn to_bytes(&self) -> Result<Cow<'_, [u8]>> {
        serde_json::to_vec(self.0)
            .map(Cow::Owned)
            .map_err(|e| Error::format(format!("issue serializing payload: {e}")))
    }
}

impl PayloadBytes for BytesPayload<'_> {
    fn to_bytes(&self) -> Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(self.0))
    }
}

impl Default for JwsBuilder<'_, NoPayload, NoSigner> {
    fn default() -> Self {
        Self::new()
    }
}

impl JwsBuilder<'_, NoPayload, NoSigner> {
    /// Returns a new [`JwsBuilder`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            typ: "JWT".into(),
            extra: HeaderMap::new(),
            detached: false,
            registry: None,
            payload: NoPayload,
            signer: NoSigner,
        }
    }
}

impl<'a, S> JwsBuilder<'a, NoPayload, S> {
    /// Set the payload to be signed.
    #[must_use]
    pub fn payload<'p, T: Serialize>(self, payload: &'p T) -> JwsBuilder<'a, Payload<'p, T>, S> {
        JwsBuilder {
            typ: self.typ,
            extra: self.extra,
            detached: self.detached,
            registry: self.registry,
            payload: Payload(payload),
            signer: self.signer,
        }
    }

    /// Set raw payload bytes to be signed.
    #[must_use]
    pub fn payload_bytes<'p>(self, payload: &'p [u8]) -> JwsBuilder<'a, BytesPayload<'p>, S> {
        JwsBuilder {
            typ: self.typ,
            extra: self.extra,
            detached: self.detached,
            registry: self.registry,
            payload: BytesPayload(payload),
            signer: self.signer,
        }
    }
}

impl<'a, P, S> JwsBuilder<'a, P, S> {
    /// Specify the `typ` header (defaults to `JWT`).
    #[must_use]
    pub fn typ(mut self, typ: impl Into<String>) -> Self {
        self.typ = typ.into();
        self
    }

    /// Add a caller-supplied header entry. Registered entries (`alg`,
    /// `typ`, `kid`) set by the builder overwrite extras on conflict.
    #[must_use]
    pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name, value);
        self
    }

    /// Emit a detached token: the payload segment stays empty while the
    /// signature still covers the payload.
    #[must_use]
    pub const fn detached(mut self) -> Self {
        self.detached = true;
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

impl<'a, P> JwsBuilder<'a, P, NoSigner> {
    /// Capture the signing credentials for the final build step.
    #[must_use]
    pub fn signer<'s, 'k>(
        self, credentials: &'s SigningCredentials<'k>,
    ) -> JwsBuilder<'a, P, WithSigner<'s, 'k>> {
        JwsBuilder {
            typ: self.typ,
            extra: self.extra,
            detached: self.detached,
            registry: self.registry,
            payload: self.payload,
            signer: WithSigner(credentials),
        }
    }
}

impl<P: PayloadBytes> JwsBuilder<'_, P, WithSigner<'_, '_>> {
    /// Generate the signed compact serialization.
    ///
    /// # Errors
    ///
    /// As for [`encode`]. No partial token is emitted on failure.
    pub fn build(self) -> Result<String> {
        let payload = self.payload.to_bytes()?;
        sign_compact(&self.typ, self.extra, self.detached, self.registry, &payload, self.signer.0)
    }
}

fn sign_compact(
    typ: &str, extra: HeaderMap, detached: bool, registry: Option<&AlgorithmRegistry>,
    payload: &[u8], credentials: &SigningCredentials<'_>,
) -> Result<String> {
    let registry = registry.unwrap_or_else(|| AlgorithmRegistry::shared());
    let algorithm = registry.signature(&credentials.algorithm)?;

    // extras first; registered entries overwrite on conflict
    let mut map = extra;
    map.insert("alg", credentials.algorithm.clone());
    map.insert("typ", typ);
    if let Some(kid) = credentials.key.key_id() {
        map.insert("kid", kid);
    }
    let header = Header::from_map(map)?;

    let encoded_payload = b64::encode(payload);
    let signing_input = format!("{}.{}", header.encoded(), encoded_payload);

    let mut signature = vec![0_u8; algorithm.signature_len(credentials.key.bit_len())];
    let Some(written) =
        algorithm.try_sign(credentials.key, signing_input.as_bytes(), &mut signature)?
    else {
        return Err(Error::configuration("signature buffer sizing"));
    };
    signature.truncate(written);
    let encoded_signature = b64::encode(&signature);

    if detached {
        Ok(format!("{}..{encoded_signature}", header.encoded()))
    } else {
        Ok(format!("{}.{encoded_payload}.{encoded_signature}", header.encoded()))
    }
}
