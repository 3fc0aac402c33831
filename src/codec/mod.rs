//! Adaptive binary-to-text codecs.
//!
//! This module provides the codec set, the method selector, the hybrid
//! benchmarker and the engine that ties them together.
//!
//! # Methods
//!
//! | Method             | Wire Format                   | Best For                          |
//! |--------------------|-------------------------------|-----------------------------------|
//! | `gzip_base64`      | bare base64                   | Medium payloads (balanced)        |
//! | `deflate_base64`   | bare base64                   | Hybrid candidate                  |
//! | `brotli_base64`    | bare base64                   | Text and documents                |
//! | `zstd_base64`      | bare base64                   | Large text (>1MB)                 |
//! | `lz4_base64`       | bare base64                   | Small payloads (speed)            |
//! | `z85`              | `Z85:<pad>:<digits>`          | Already-compressed media          |
//! | `base91`           | `B91:<symbols>`               | Densest text encoding             |
//! | `streaming_gzip`   | `STREAM:<n>:<c1>\|<c2>...`    | Payloads over 10MB                |
//! | `hybrid`           | `HYBRID:<method>:<artifact>`  | Everything else (benchmarked)     |
//! | `base64_only`      | bare base64                   | Fallback when a codec fails       |
//!
//! Bare artifacts are **not** self-describing: callers must keep the
//! [`CompressionMetadata`] returned by `compress` and hand it back to
//! `decompress`. Self-describing artifacts can also be decoded with
//! [`CompressionEngine::decompress_framed`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use metadoc::codec::{CompressionEngine, Method, MethodRequest};
//!
//! let engine = CompressionEngine::new();
//!
//! let (text, meta) = engine.compress(b"Hello, World!", Method::Z85, 6)?;
//! assert!(text.starts_with("Z85:"));
//!
//! let (text, meta) = engine.compress(&payload, MethodRequest::Auto, 6)?;
//! let original = engine.decompress(&text, &meta)?;
//! ```

mod backend;
mod base91;
mod capabilities;
mod engine;
pub mod framing;
mod hybrid;
mod method;
mod pipeline;
mod raw;
mod selector;
mod streaming;
mod z85;

pub use backend::Backend;
pub use base91::Base91Codec;
pub use capabilities::CapabilitySet;
pub use engine::CompressionEngine;
pub use framing::{detect_method, Frame};
pub use hybrid::{select_best, HybridBenchmarker, Trial};
pub use method::{CompressionMetadata, ContentType, Method, MethodRequest};
pub(crate) use method::base64_len;
pub use pipeline::{PipelineCodec, DEFAULT_LEVEL};
pub use raw::RawCodec;
pub use selector::select_method;
pub use streaming::{StreamingCodec, DEFAULT_CHUNK_SIZE};
pub use z85::Z85Codec;

use crate::error::{MetaDocError, Result};

/// A paired encode/decode implementation for one representation strategy.
///
/// Codecs hold no state between calls.
pub trait Codec {
    /// Encode bytes into a text-safe string.
    fn encode(&self, data: &[u8]) -> Result<String>;

    /// Decode a string produced by [`Codec::encode`].
    fn decode(&self, text: &str) -> Result<Vec<u8>>;
}

/// Encode with a non-wrapper method.
pub(crate) fn encode_leaf(method: Method, data: &[u8], level: u32) -> Result<String> {
    match method {
        Method::Z85 => Z85Codec.encode(data),
        Method::Base91 => Base91Codec.encode(data),
        Method::Raw => RawCodec.encode(data),
        Method::Streaming | Method::Hybrid => Err(MetaDocError::UnsupportedMethod(format!(
            "{method} is not a leaf codec"
        ))),
        pipeline => match pipeline.backend() {
            Some(backend) => PipelineCodec::new(backend, level).encode(data),
            None => Err(MetaDocError::UnsupportedMethod(pipeline.to_string())),
        },
    }
}

/// Decode with a non-wrapper method.
pub(crate) fn decode_leaf(method: Method, text: &str) -> Result<Vec<u8>> {
    match method {
        Method::Z85 => Z85Codec.decode(text),
        Method::Base91 => Base91Codec.decode(text),
        Method::Raw => RawCodec.decode(text),
        Method::Streaming | Method::Hybrid => Err(MetaDocError::UnsupportedMethod(format!(
            "{method} is not a leaf codec"
        ))),
        pipeline => match pipeline.backend() {
            Some(backend) => PipelineCodec::new(backend, DEFAULT_LEVEL).decode(text),
            None => Err(MetaDocError::UnsupportedMethod(pipeline.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_dispatch_roundtrip() {
        let data = b"leaf dispatch leaf dispatch leaf dispatch";
        for method in [
            Method::Gzip,
            Method::Deflate,
            Method::Brotli,
            Method::Z85,
            Method::Base91,
            Method::Raw,
        ] {
            let encoded = encode_leaf(method, data, DEFAULT_LEVEL).unwrap();
            assert_eq!(decode_leaf(method, &encoded).unwrap(), data, "{method}");
        }
    }

    #[test]
    fn test_wrappers_are_not_leaves() {
        assert!(matches!(
            encode_leaf(Method::Hybrid, b"x", 6),
            Err(MetaDocError::UnsupportedMethod(_))
        ));
        assert!(matches!(
            decode_leaf(Method::Streaming, "STREAM:0:"),
            Err(MetaDocError::UnsupportedMethod(_))
        ));
    }
}
