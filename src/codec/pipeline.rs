//! Backend pipeline codecs: compress with a backend, then base64.
//!
//! Output is bare base64 with no prefix. Decoding requires the method from
//! the metadata record; the artifact is never sniffed.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::{Backend, Codec, Method};
use crate::error::Result;

/// Default compression level
pub const DEFAULT_LEVEL: u32 = 6;

/// Backend-then-base64 codec
#[derive(Debug, Clone, Copy)]
pub struct PipelineCodec {
    /// Backend compressor
    pub backend: Backend,
    /// Compression level (clamped per backend)
    pub level: u32,
}

impl PipelineCodec {
    /// Create a pipeline codec
    pub fn new(backend: Backend, level: u32) -> Self {
        Self { backend, level }
    }

    /// Method implemented by this codec
    pub fn method(&self) -> Method {
        Method::pipeline(self.backend)
    }
}

impl Codec for PipelineCodec {
    fn encode(&self, data: &[u8]) -> Result<String> {
        let compressed = self.backend.compress(data, self.level)?;
        Ok(BASE64.encode(compressed))
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>> {
        let compressed = BASE64.decode(text)?;
        self.backend.decompress(&compressed)
    }
}
