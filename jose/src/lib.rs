//! # Sigil JOSE Token Engine
//!
//! Encodes and decodes cryptographically protected tokens in the JWS
//! ([RFC7515]) and JWE ([RFC7516]) compact serializations, on top of the
//! pluggable algorithm families of [`sigil_crypto`] ([RFC7518]).
//!
//! The engine is a library with no transport, storage, or key-discovery
//! opinions: collaborators supply [`SecretKey`] material from their own
//! key stores, payloads are any `serde` type, and every operation runs
//! synchronously to completion on the calling thread.
//!
//! Signing:
//!
//! ```
//! use sigil_jose::{SecretKey, jws};
//!
//! let key = SecretKey::generate_symmetric(256)?.with_key_id("k1");
//! let credentials = jws::SigningCredentials::new(&key, "HS256");
//!
//! let token = jws::encode(&"hello", &credentials)?;
//! let decoded: sigil_jose::Jwt<String> = jws::decode(&token, &key)?;
//! assert_eq!(decoded.claims, "hello");
//! # Ok::<(), sigil_jose::Error>(())
//! ```
//!
//! Encrypting:
//!
//! ```
//! use sigil_jose::{SecretKey, jwe};
//!
//! let recipient = SecretKey::generate_x25519();
//! let token = jwe::JweBuilder::new()
//!     .payload(&"hello")
//!     .recipient(&recipient)
//!     .build()?;
//! let decoded: sigil_jose::Jwt<String> = jwe::decrypt(&token, &recipient)?;
//! assert_eq!(decoded.claims, "hello");
//! # Ok::<(), sigil_jose::Error>(())
//! ```
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

pub mod claims;
pub mod header;
pub mod jwe;
pub mod jws;
pub mod jwt;
pub mod token;

pub use sigil_crypto::{
    AlgorithmRegistry, Error, HeaderMap, KeyMetadata, RegistryBuilder, Result, SecretKey,
};

pub use crate::claims::Claims;
pub use crate::header::Header;
pub use crate::jwe::{EncryptionCredentials, JweBuilder};
pub use crate::jws::{JwsBuilder, SigningCredentials};
pub use crate::jwt::Jwt;
pub use crate::token::Compact;
