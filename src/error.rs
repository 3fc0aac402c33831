//! MetaDoc error types.
//!
//! # Propagation Policy
//!
//! Errors fall into two groups:
//!
//! - **Recovered locally**: `BackendUnavailable` and `CandidateFailure` are
//!   produced at codec boundaries during encoding and absorbed by the engine's
//!   fallback chain. `compress` never surfaces them.
//! - **Surfaced to the caller**: every decoding error (`UnsupportedMethod`,
//!   `MalformedFraming`, `ChunkCountMismatch`, `MethodMismatch`, ...). There
//!   is no safe recovery on decode: the bytes would otherwise be silently wrong.
//!
//! `InvalidArgument` is the only error `compress` returns.

use thiserror::Error;

use crate::codec::{Backend, Method};

/// MetaDoc errors.
#[derive(Error, Debug)]
pub enum MetaDocError {
    /// Method tag not recognized.
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Self-describing prefix present but structurally invalid.
    #[error("Malformed framing: {0}")]
    MalformedFraming(String),

    /// Declared chunk count differs from the number of parsed segments.
    #[error("Chunk count mismatch: declared {declared}, found {actual}")]
    ChunkCountMismatch {
        /// Count written in the frame header.
        declared: usize,
        /// Segments actually present.
        actual: usize,
    },

    /// Metadata names a different codec than the artifact's own prefix.
    #[error("Method mismatch: metadata says {declared}, artifact is {detected}")]
    MethodMismatch {
        /// Method from the metadata record.
        declared: Method,
        /// Method sniffed from the artifact.
        detected: Method,
    },

    /// Backend compressor is not part of the capability set.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(Backend),

    /// A hybrid candidate failed and was dropped from scoring.
    #[error("Candidate {method} failed: {reason}")]
    CandidateFailure {
        /// Candidate method.
        method: Method,
        /// Failure description.
        reason: String,
    },

    /// Backend compression failed.
    #[error("Compression error: {0}")]
    Compression(String),

    /// Backend decompression or text decoding failed.
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Caller passed an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for MetaDoc operations
pub type Result<T> = std::result::Result<T, MetaDocError>;

impl MetaDocError {
    /// Whether this error belongs to the decode-side kinds that are always
    /// surfaced to the caller.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            MetaDocError::UnsupportedMethod(_)
                | MetaDocError::MalformedFraming(_)
                | MetaDocError::ChunkCountMismatch { .. }
                | MetaDocError::MethodMismatch { .. }
                | MetaDocError::Decompression(_)
        )
    }
}

impl From<toml::de::Error> for MetaDocError {
    fn from(err: toml::de::Error) -> Self {
        MetaDocError::Config(err.to_string())
    }
}

impl From<base64::DecodeError> for MetaDocError {
    fn from(err: base64::DecodeError) -> Self {
        MetaDocError::Decompression(format!("Base64 decode error: {err}"))
    }
}
