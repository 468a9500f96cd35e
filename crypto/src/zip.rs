//! # Payload Compression
//!
//! The `zip` strategy a JWE can name ([RFC7516] §4.1.3): raw DEFLATE
//! ([RFC1951]) under the code `DEF`. Decompression is bounded so a small
//! hostile token cannot expand into arbitrary memory.
//!
//! [RFC7516]: https://www.rfc-editor.org/rfc/rfc7516
//! [RFC1951]: https://www.rfc-editor.org/rfc/rfc1951

use std::io::Read;

use flate2::Compression;
use flate2::read::{DeflateDecoder, DeflateEncoder};

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::{Error, Result};

/// Largest payload a compressed token may expand to.
const MAX_DECOMPRESSED_LEN: u64 = 8 * 1024 * 1024;

/// A payload compression strategy.
pub trait CompressionAlgorithm: Algorithm {
    /// Compress `data`, appending to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] when the transform fails.
    fn compress(&self, data: &[u8], sink: &mut Vec<u8>) -> Result<()>;

    /// Decompress `data`, appending to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] for malformed input or output beyond the
    /// decompression bound.
    fn decompress(&self, data: &[u8], sink: &mut Vec<u8>) -> Result<()>;
}

/// DEFLATE compression (`DEF`).
pub struct Deflate;

impl Algorithm for Deflate {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Compression
    }

    fn code(&self) -> &'static str {
        "DEF"
    }
}

impl CompressionAlgorithm for Deflate {
    fn compress(&self, data: &[u8], sink: &mut Vec<u8>) -> Result<()> {
        let mut encoder = DeflateEncoder::new(data, Compression::default());
        encoder
            .read_to_end(sink)
            .map_err(|e| Error::format(format!("deflate compression failed: {e}")))?;
        Ok(())
    }

    fn decompress(&self, data: &[u8], sink: &mut Vec<u8>) -> Result<()> {
        let start = sink.len();
        let decoder = DeflateDecoder::new(data);
        // read one byte past the cap so oversize is detectable
        let mut bounded = decoder.take(MAX_DECOMPRESSED_LEN + 1);
        let read = match bounded.read_to_end(sink) {
            Ok(read) => read,
            Err(e) => {
                sink.truncate(start);
                return Err(Error::format(format!("deflate decompression failed: {e}")));
            }
        };
        if read as u64 > MAX_DECOMPRESSED_LEN {
            sink.truncate(start);
            return Err(Error::format("decompressed payload exceeds the size bound"));
        }
        Ok(())
    }
}
