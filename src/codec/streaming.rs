//! Chunked streaming wrapper for very large payloads.
//!
//! The payload is cut into fixed-size chunks (the last one may be shorter),
//! each chunk runs through the inner pipeline on its own, and the results are
//! joined into one `STREAM:` frame:
//!
//! ```text
//! STREAM:<count>:<chunk1>|<chunk2>|...
//! ```
//!
//! Boundaries never depend on content, so decoding is purely positional.
//! The chunk text is standard base64 and cannot contain the `|` separator.

use super::framing::{self, Frame};
use super::{Backend, Codec, PipelineCodec};
use crate::error::{MetaDocError, Result};

/// Default chunk size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Streaming wrapper around a backend pipeline
#[derive(Debug, Clone, Copy)]
pub struct StreamingCodec {
    inner: PipelineCodec,
    chunk_size: usize,
}

impl StreamingCodec {
    /// Wrap a pipeline. A zero chunk size is an invalid argument.
    pub fn new(inner: PipelineCodec, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(MetaDocError::InvalidArgument(
                "chunk size must be positive".to_string(),
            ));
        }
        Ok(Self { inner, chunk_size })
    }

    /// gzip pipeline at `level` with the default chunk size
    pub fn gzip(level: u32) -> Self {
        Self {
            inner: PipelineCodec::new(Backend::Gzip, level),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Chunk size in bytes
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks a payload of `len` bytes is split into
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }
}

impl Codec for StreamingCodec {
    fn encode(&self, data: &[u8]) -> Result<String> {
        let chunks = data
            .chunks(self.chunk_size)
            .map(|chunk| self.inner.encode(chunk))
            .collect::<Result<Vec<_>>>()?;
        Ok(framing::write_stream(&chunks))
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>> {
        let chunks = match Frame::parse(text)? {
            Frame::Stream { chunks } => chunks,
            _ => {
                return Err(MetaDocError::MalformedFraming(
                    "expected STREAM frame".to_string(),
                ))
            },
        };

        // Output grows from what each chunk actually decodes to; the declared
        // count is caller-controlled and never sizes an allocation.
        let mut out = Vec::new();
        for (idx, chunk) in chunks.into_iter().enumerate() {
            if chunk.is_empty() {
                return Err(MetaDocError::MalformedFraming(format!(
                    "STREAM chunk {idx} is empty"
                )));
            }
            out.extend(self.inner.decode(chunk)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(chunk_size: usize) -> StreamingCodec {
        StreamingCodec::new(PipelineCodec::new(Backend::Gzip, 6), chunk_size).unwrap()
    }

    #[test]
    fn test_exact_multiple() {
        let codec = small(16);
        let data: Vec<u8> = (0..64u8).collect();
        let encoded = codec.encode(&data).unwrap();
        assert!(encoded.starts_with("STREAM:4:"));
        assert_eq!(codec.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_short_remainder() {
        let codec = small(16);
        let data: Vec<u8> = (0..70u8).collect();
        let encoded = codec.encode(&data).unwrap();
        assert!(encoded.starts_with("STREAM:5:"));
        assert_eq!(codec.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_empty_payload() {
        let codec = StreamingCodec::gzip(6);
        assert_eq!(codec.encode(b"").unwrap(), "STREAM:0:");
        assert!(codec.decode("STREAM:0:").unwrap().is_empty());
    }

    #[test]
    fn test_dropped_chunk_is_detected() {
        let codec = small(4);
        let encoded = codec.encode(b"abcdefghij").unwrap();
        let truncated = encoded.rsplit_once('|').unwrap().0;
        assert!(matches!(
            codec.decode(truncated),
            Err(MetaDocError::ChunkCountMismatch {
                declared: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_chunk_count() {
        let codec = small(10);
        assert_eq!(codec.chunk_count(0), 0);
        assert_eq!(codec.chunk_count(10), 1);
        assert_eq!(codec.chunk_count(11), 2);
    }

    #[test]
    fn test_many_empty_segments_rejected() {
        let codec = StreamingCodec::gzip(6);
        let n = 2_000_000;
        let frame = format!("STREAM:{n}:{}", "|".repeat(n - 1));
        assert!(matches!(
            codec.decode(&frame),
            Err(MetaDocError::MalformedFraming(_))
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            StreamingCodec::new(PipelineCodec::new(Backend::Gzip, 6), 0),
            Err(MetaDocError::InvalidArgument(_))
        ));
    }
}
