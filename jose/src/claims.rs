//! # Registered Claims
//!
//! The registered claim names of [RFC7519] §4.1, for callers that want a
//! typed claims set instead of an ad-hoc payload. All fields are
//! optional; absent claims are omitted from the serialized object.
//!
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sigil_crypto::{Error, Result};

/// RFC 7519 registered claims.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Claims {
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Expiration time, as seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not-before time, as seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued-at time, as seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Token identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// An empty claims set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `iat` with the current time.
    #[must_use]
    pub fn issued_now(mut self) -> Self {
        self.iat = Some(Utc::now().timestamp());
        self
    }

    /// Set `exp` relative to the current time.
    #[must_use]
    pub fn expires_in(mut self, validity: Duration) -> Self {
        self.exp = Some((Utc::now() + validity).timestamp());
        self
    }

    /// Check `exp` and `nbf` against the given instant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] when the token is expired or not
    /// yet valid.
    pub fn validate_time(&self, now: DateTime<Utc>) -> Result<()> {
        let now = now.timestamp();
        if self.exp.is_some_and(|exp| exp <= now) {
            return Err(Error::Verification);
        }
        if self.nbf.is_some_and(|nbf| nbf > now) {
            return Err(Error::Verification);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn absent_claims_omitted() {
        let claims = Claims { sub: Some("alice".into()), ..Claims::default() };
        let json = serde_json::to_string(&claims).expect("should serialize");
        assert_eq!(json, r#"{"sub":"alice"}"#);
    }

    #[test]
    fn time_validation() {
        let now = Utc::now();
        let claims = Claims::new().issued_now().expires_in(Duration::minutes(5));
        claims.validate_time(now).expect("should be valid");

        let expired = Claims { exp: Some(now.timestamp() - 1), ..Claims::default() };
        assert!(matches!(expired.validate_time(now), Err(Error::Verification)));

        let premature = Claims { nbf: Some(now.timestamp() + 60), ..Claims::default() };
        assert!(matches!(premature.validate_time(now), Err(Error::Verification)));
    }
}
