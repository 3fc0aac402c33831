//! Codec names, method requests and per-call metadata.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Backend;
use crate::error::{MetaDocError, Result};

/// Closed set of codecs the engine can produce.
///
/// Variants are listed in candidate enumeration order; the derived `Ord`
/// follows it and is used for deterministic tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    /// gzip container, then base64
    Gzip,
    /// zlib/deflate, then base64
    Deflate,
    /// Brotli, then base64
    Brotli,
    /// Zstandard, then base64
    Zstd,
    /// LZ4 frame, then base64
    Lz4,
    /// Base-85 text codec (`Z85:` prefix)
    Z85,
    /// Base-91 text codec (`B91:` prefix)
    Base91,
    /// Fixed-size chunked gzip pipeline (`STREAM:` prefix)
    Streaming,
    /// Benchmarked best-of candidates (`HYBRID:` prefix)
    Hybrid,
    /// Plain base64, last-resort fallback
    Raw,
}

impl Method {
    /// Every method in enumeration order.
    pub const ALL: [Method; 10] = [
        Method::Gzip,
        Method::Deflate,
        Method::Brotli,
        Method::Zstd,
        Method::Lz4,
        Method::Z85,
        Method::Base91,
        Method::Streaming,
        Method::Hybrid,
        Method::Raw,
    ];

    /// Stable wire name, used in `HYBRID:` frames and serialized metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Method::Gzip => "gzip_base64",
            Method::Deflate => "deflate_base64",
            Method::Brotli => "brotli_base64",
            Method::Zstd => "zstd_base64",
            Method::Lz4 => "lz4_base64",
            Method::Z85 => "z85",
            Method::Base91 => "base91",
            Method::Streaming => "streaming_gzip",
            Method::Hybrid => "hybrid",
            Method::Raw => "base64_only",
        }
    }

    /// Backend compressor behind a backend-pipeline method.
    pub fn backend(&self) -> Option<Backend> {
        match self {
            Method::Gzip => Some(Backend::Gzip),
            Method::Deflate => Some(Backend::Deflate),
            Method::Brotli => Some(Backend::Brotli),
            Method::Zstd => Some(Backend::Zstd),
            Method::Lz4 => Some(Backend::Lz4),
            _ => None,
        }
    }

    /// Backend-pipeline method for a backend.
    pub fn pipeline(backend: Backend) -> Self {
        match backend {
            Backend::Gzip => Method::Gzip,
            Backend::Deflate => Method::Deflate,
            Backend::Brotli => Method::Brotli,
            Backend::Zstd => Method::Zstd,
            Backend::Lz4 => Method::Lz4,
        }
    }

    /// Whether the artifact carries its own prefix and decodes without metadata.
    ///
    /// Backend pipelines and the raw fallback produce bare output: callers
    /// must keep [`CompressionMetadata::method`] to decode them.
    pub fn is_self_describing(&self) -> bool {
        matches!(
            self,
            Method::Z85 | Method::Base91 | Method::Streaming | Method::Hybrid
        )
    }

    /// Whether the method wraps other codecs.
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Method::Streaming | Method::Hybrid)
    }

    /// Whether a compression level is recorded for this method.
    pub fn uses_level(&self) -> bool {
        self.backend().is_some() || *self == Method::Streaming
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = MetaDocError;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| MetaDocError::UnsupportedMethod(s.to_string()))
    }
}

impl TryFrom<String> for Method {
    type Error = MetaDocError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.name().to_string()
    }
}

/// Method requested by a caller: a concrete codec or `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodRequest {
    /// Let the selector decide
    #[default]
    Auto,
    /// Use this codec
    Exact(Method),
}

impl From<Method> for MethodRequest {
    fn from(method: Method) -> Self {
        MethodRequest::Exact(method)
    }
}

impl FromStr for MethodRequest {
    type Err = MetaDocError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "auto" {
            Ok(MethodRequest::Auto)
        } else {
            s.parse().map(MethodRequest::Exact)
        }
    }
}

/// Content-type hint supplied by collaborators (file sniffing happens upstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    /// Raster images
    Image,
    /// Video containers
    Video,
    /// Audio containers
    Audio,
    /// PDFs and plain text
    DocumentText,
    /// JSON, XML and similar
    StructuredText,
    /// No hint
    #[default]
    Unknown,
}

impl ContentType {
    /// Map a loose type label to a hint. Unrecognized labels are `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "image" => ContentType::Image,
            "video" => ContentType::Video,
            "audio" => ContentType::Audio,
            "document-text" | "pdf" | "text" | "document" => ContentType::DocumentText,
            "structured-text" | "json" | "xml" | "spreadsheet" => ContentType::StructuredText,
            _ => ContentType::Unknown,
        }
    }

    /// Already-compressed media.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            ContentType::Image | ContentType::Video | ContentType::Audio
        )
    }

    /// Text-heavy content.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ContentType::DocumentText | ContentType::StructuredText
        )
    }
}

/// Record produced once per `compress` call.
///
/// Required to decode bare artifacts: `method` is the codec actually used,
/// which differs from the request whenever the fallback chain kicked in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionMetadata {
    /// Codec actually used
    pub method: Method,
    /// Payload length in bytes
    pub original_size: usize,
    /// UTF-8 byte length of the produced string
    pub compressed_size: usize,
    /// `1 - compressed/original`
    pub compression_ratio: f64,
    /// `compressed/original`
    pub efficiency: f64,
    /// `original - compressed` (negative when the encoding grew)
    pub space_saved: i64,
    /// Wall-clock encode time
    pub processing_time_ms: f64,
    /// `1 - compressed/base64_len`
    pub baseline_improvement: f64,
    /// Level applied, for methods with a tunable backend
    pub compression_level: Option<u32>,
}

impl CompressionMetadata {
    /// Measure an encoded artifact.
    pub fn measure(
        method: Method,
        original_size: usize,
        encoded: &str,
        elapsed: Duration,
        level: u32,
    ) -> Self {
        let compressed_size = encoded.len();
        let (compression_ratio, efficiency) = if original_size == 0 {
            (0.0, 1.0)
        } else {
            let efficiency = compressed_size as f64 / original_size as f64;
            (1.0 - efficiency, efficiency)
        };

        let baseline = base64_len(original_size);
        let baseline_improvement = if baseline == 0 {
            0.0
        } else {
            1.0 - compressed_size as f64 / baseline as f64
        };

        Self {
            method,
            original_size,
            compressed_size,
            compression_ratio,
            efficiency,
            space_saved: original_size as i64 - compressed_size as i64,
            processing_time_ms: elapsed.as_secs_f64() * 1000.0,
            baseline_improvement,
            compression_level: method.uses_level().then_some(level),
        }
    }

    /// Parse a metadata record from JSON.
    ///
    /// An unknown `method` tag is reported as `UnsupportedMethod` rather than
    /// a generic JSON error.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(name) = value.get("method").and_then(|m| m.as_str()) {
            name.parse::<Method>()?;
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether the encoding beat plain base64.
    pub fn is_beneficial(&self) -> bool {
        self.baseline_improvement > 0.0
    }
}

/// Padded base64 length of `n` bytes.
pub(crate) fn base64_len(n: usize) -> usize {
    n.div_ceil(3) * 4
}
