//! # Sigil Cryptographic Primitives
//!
//! The substrate under the Sigil JOSE token engine: a base64url codec, a
//! zero-on-release buffer pool, the [`SecretKey`] model, and the four
//! algorithm families ([RFC7518]) behind the [`AlgorithmRegistry`] —
//! digital signature, key management, authenticated content encryption,
//! and payload compression.
//!
//! Everything here is synchronous and free of shared mutable state:
//! algorithm objects are stateless and safe to share between threads, and
//! each buffer lease has a single owner for its lifetime.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

pub mod aead;
pub mod b64;
mod buffer;
mod error;
mod header_map;
mod key;
pub mod keywrap;
mod registry;
pub mod sig;
pub mod zip;

mod alg;

pub use self::alg::{Algorithm, AlgorithmFamily};
pub use self::buffer::{Lease, rent, rent_scratch};
pub use self::error::{Error, Result};
pub use self::header_map::HeaderMap;
pub use self::key::{KeyMetadata, SecretKey, ensure_bit_len};
pub use self::registry::{AlgorithmRegistry, RegistryBuilder};
