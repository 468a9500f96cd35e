//! # JOSE Header
//!
//! The finalized protected header of a compact token. A [`Header`] is
//! built from a [`HeaderMap`] exactly once — the UTF-8 JSON and its
//! base64url encoding are captured at that moment — so the bytes that
//! were signed or fed to the AEAD as associated data can never drift
//! from what the wire carries. Parsing keeps the received encoding
//! verbatim for the same reason.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;
use sigil_crypto::{b64, Error, HeaderMap, Result};

/// An immutable, finalized JOSE protected header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    map: HeaderMap,
    encoded: String,
}

impl Header {
    /// Finalize a header map. After this point the serialized form is
    /// fixed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] when the map cannot be serialized.
    pub fn from_map(map: HeaderMap) -> Result<Self> {
        let json = serde_json::to_vec(&map)
            .map_err(|e| Error::format(format!("issue serializing header: {e}")))?;
        let encoded = b64::encode(&json);
        Ok(Self { map, encoded })
    }

    /// Parse a header from its base64url segment, keeping the received
    /// encoding verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] for bad base64url or JSON that is not an
    /// object.
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let json =
            b64::decode(encoded).map_err(|_| Error::format("issue decoding header segment"))?;
        let map: HeaderMap = serde_json::from_slice(&json)
            .map_err(|e| Error::format(format!("issue deserializing header: {e}")))?;
        Ok(Self { map, encoded: encoded.to_string() })
    }

    /// The base64url encoding of the header, exactly as signed /
    /// authenticated.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The underlying entries.
    #[must_use]
    pub const fn map(&self) -> &HeaderMap {
        &self.map
    }

    /// Look up an arbitrary entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    /// The `alg` (algorithm) entry.
    #[must_use]
    pub fn alg(&self) -> Option<&str> {
        self.map.get_str("alg")
    }

    /// The `enc` (content encryption algorithm) entry.
    #[must_use]
    pub fn enc(&self) -> Option<&str> {
        self.map.get_str("enc")
    }

    /// The `zip` (compression algorithm) entry.
    #[must_use]
    pub fn zip(&self) -> Option<&str> {
        self.map.get_str("zip")
    }

    /// The `typ` (token type) entry.
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.map.get_str("typ")
    }

    /// The `cty` (content type) entry.
    #[must_use]
    pub fn cty(&self) -> Option<&str> {
        self.map.get_str("cty")
    }

    /// The `kid` (key id) entry.
    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.map.get_str("kid")
    }

    /// The `crit` (critical extensions) entry.
    ///
    /// This engine implements no critical extensions, so decoders reject
    /// any token carrying a non-empty `crit` list.
    #[must_use]
    pub fn crit(&self) -> Option<&Value> {
        self.map.get("crit")
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encoded)
    }
}

impl Serialize for Header {
    fn serialize<S: serde::Serializer>(
        &self, serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.map.serialize(serializer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn finalized_encoding_is_stable() {
        let mut map = HeaderMap::new();
        map.insert("alg", "HS256");
        map.insert("kid", "k1");
        let header = Header::from_map(map).expect("should finalize");

        let reparsed = Header::from_encoded(header.encoded()).expect("should parse");
        assert_eq!(reparsed, header);
        assert_eq!(reparsed.alg(), Some("HS256"));
        assert_eq!(reparsed.kid(), Some("k1"));
    }

    #[test]
    fn verbatim_encoding_survives_reordering() {
        // two headers with the same entries in different order keep their
        // own encodings; the authenticated bytes never drift
        let a = Header::from_encoded(&b64::encode(br#"{"alg":"dir","enc":"A256GCM"}"#))
            .expect("should parse");
        let b = Header::from_encoded(&b64::encode(br#"{"enc":"A256GCM","alg":"dir"}"#))
            .expect("should parse");
        assert_eq!(a.alg(), b.alg());
        assert_ne!(a.encoded(), b.encoded());
    }

    #[test]
    fn non_object_header_rejected() {
        let encoded = b64::encode(b"[1,2,3]");
        assert!(matches!(Header::from_encoded(&encoded), Err(Error::Format(_))));
    }
}
