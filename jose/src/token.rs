//! # Compact Token Model
//!
//! The parsed shape of a compact serialization prior to (or after)
//! cryptographic processing: base64url segments joined by `.`, three for
//! a JWS ([RFC7515] §7.1), five for a JWE ([RFC7516] §7.1). Any other
//! segment count is malformed. Segments stay in their encoded form; only
//! the header is decoded at parse time.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516

use std::fmt::{self, Display};
use std::str::FromStr;

use sigil_crypto::{Error, Result};

use crate::header::Header;

/// The segments of a compact JWS.
#[derive(Clone, Debug)]
pub struct JwsParts {
    /// Decoded protected header (its verbatim encoding is the first
    /// segment).
    pub header: Header,

    /// Base64url payload segment; empty for detached content.
    pub payload: String,

    /// Base64url signature segment.
    pub signature: String,
}

/// The segments of a compact JWE.
#[derive(Clone, Debug)]
pub struct JweParts {
    /// Decoded protected header (its verbatim encoding is the first
    /// segment and the AEAD associated data).
    pub header: Header,

    /// Base64url encrypted-CEK segment; empty for direct modes.
    pub encrypted_key: String,

    /// Base64url initialization-vector segment.
    pub iv: String,

    /// Base64url ciphertext segment.
    pub ciphertext: String,

    /// Base64url authentication-tag segment.
    pub tag: String,
}

/// A parsed compact token: signed or encrypted.
#[derive(Clone, Debug)]
pub enum Compact {
    /// Three segments: a JWS.
    Jws(JwsParts),

    /// Five segments: a JWE.
    Jwe(JweParts),
}

impl Compact {
    /// The token's protected header.
    #[must_use]
    pub const fn header(&self) -> &Header {
        match self {
            Self::Jws(jws) => &jws.header,
            Self::Jwe(jwe) => &jwe.header,
        }
    }

    /// Unwrap as a JWS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] when the token is a JWE.
    pub fn into_jws(self) -> Result<JwsParts> {
        match self {
            Self::Jws(jws) => Ok(jws),
            Self::Jwe(_) => Err(Error::format("expected a signed (3-segment) token")),
        }
    }

    /// Unwrap as a JWE.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] when the token is a JWS.
    pub fn into_jwe(self) -> Result<JweParts> {
        match self {
            Self::Jwe(jwe) => Ok(jwe),
            Self::Jws(_) => Err(Error::format("expected an encrypted (5-segment) token")),
        }
    }
}

impl FromStr for Compact {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [header, payload, signature] => Ok(Self::Jws(JwsParts {
                header: Header::from_encoded(header)?,
                payload: (*payload).to_string(),
                signature: (*signature).to_string(),
            })),
            [header, encrypted_key, iv, ciphertext, tag] => Ok(Self::Jwe(JweParts {
                header: Header::from_encoded(header)?,
                encrypted_key: (*encrypted_key).to_string(),
                iv: (*iv).to_string(),
                ciphertext: (*ciphertext).to_string(),
                tag: (*tag).to_string(),
            })),
            parts => Err(Error::format(format!(
                "invalid compact serialization: {} segments",
                parts.len()
            ))),
        }
    }
}

impl Display for Compact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jws(jws) => {
                write!(f, "{}.{}.{}", jws.header.encoded(), jws.payload, jws.signature)
            }
            Self::Jwe(jwe) => write!(
                f,
                "{}.{}.{}.{}.{}",
                jwe.header.encoded(),
                jwe.encrypted_key,
                jwe.iv,
                jwe.ciphertext,
                jwe.tag
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use sigil_crypto::b64;

    use super::*;

    fn header_segment() -> String {
        b64::encode(br#"{"alg":"HS256"}"#)
    }

    #[test]
    fn three_segments_parse_as_jws() {
        let token = format!("{}.cGF5bG9hZA.c2ln", header_segment());
        let compact: Compact = token.parse().expect("should parse");
        assert!(matches!(compact, Compact::Jws(_)));
        assert_eq!(compact.to_string(), token);
    }

    #[test]
    fn five_segments_parse_as_jwe() {
        let token = format!("{}.a2V5.aXY.Y3Q.dGFn", header_segment());
        let compact: Compact = token.parse().expect("should parse");
        assert!(matches!(compact, Compact::Jwe(_)));
        assert_eq!(compact.to_string(), token);
    }

    #[test]
    fn wrong_segment_counts_rejected() {
        for token in [
            "".to_string(),
            header_segment(),
            format!("{}.b", header_segment()),
            format!("{}.b.c.d", header_segment()),
            format!("{}.b.c.d.e.f", header_segment()),
        ] {
            let result: Result<Compact> = token.parse();
            assert!(matches!(result, Err(Error::Format(_))), "token {token:?}");
        }
    }

    #[test]
    fn detached_payload_keeps_three_segments() {
        let token = format!("{}..c2ln", header_segment());
        let compact: Compact = token.parse().expect("should parse");
        let jws = compact.into_jws().expect("should be a JWS");
        assert!(jws.payload.is_empty());
    }

    #[test]
    fn malformed_header_rejected() {
        let result: Result<Compact> = "not-base64!.b.c".parse();
        assert!(matches!(result, Err(Error::Format(_))));
    }
}
