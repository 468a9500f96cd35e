//! # JSON Web Token (JWT)
//!
//! JSON Web Token (JWT) is a compact, URL-safe means of representing
//! claims to be transferred between two parties. The claims are encoded
//! as a JSON object used as the payload of a JWS structure or the
//! plaintext of a JWE structure, enabling them to be digitally signed,
//! MACed, and/or encrypted.

use serde::Serialize;

use crate::header::Header;

/// A decoded token: the verified (or decrypted) header plus the claims.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Jwt<T> {
    /// The protected header.
    pub header: Header,

    /// The claims.
    pub claims: T,
}
