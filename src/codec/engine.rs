//! Compression engine: method dispatch, fallback chain and statistics.
//!
//! `compress` never fails because a codec failed. Any codec error is logged
//! and the payload is re-encoded as plain base64, with the metadata naming
//! the method actually used. The only outward error is an invalid level.
//!
//! `decompress` surfaces every error: a bad frame, an unknown method or a
//! metadata/prefix disagreement all stop decoding.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::framing::detect_method;
use super::hybrid::decode_hybrid;
use super::{
    decode_leaf, encode_leaf, select_method, Backend, CapabilitySet, Codec, CompressionMetadata,
    ContentType, HybridBenchmarker, Method, MethodRequest, PipelineCodec, RawCodec,
    StreamingCodec,
};
use crate::config::{Config, MAX_LEVEL};
use crate::error::{MetaDocError, Result};
use crate::stats::{CompressionReport, StatsAccumulator};

/// Adaptive binary-to-text engine.
///
/// Capabilities are fixed at construction. The statistics accumulator sits
/// behind a mutex, so one engine can be shared across worker threads.
#[derive(Debug)]
pub struct CompressionEngine {
    config: Config,
    capabilities: CapabilitySet,
    stats: Mutex<StatsAccumulator>,
}

impl Default for CompressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionEngine {
    /// Engine with default configuration and probed capabilities
    pub fn new() -> Self {
        let config = Config::default();
        let capabilities = CapabilitySet::probe_with(&config.backends);
        Self::build(config, capabilities)
    }

    /// Engine with a validated configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let capabilities = CapabilitySet::probe_with(&config.backends);
        Ok(Self::build(config, capabilities))
    }

    /// Replace the probed capabilities
    pub fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = capabilities;
        self
    }

    fn build(config: Config, capabilities: CapabilitySet) -> Self {
        Self {
            config,
            capabilities,
            stats: Mutex::new(StatsAccumulator::new()),
        }
    }

    /// Capability set in use
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Method the selector would pick for a payload
    pub fn select_method(&self, size: usize, hint: ContentType) -> Method {
        select_method(size, hint, &self.capabilities, &self.config.selection)
    }

    /// Compress with no content-type hint.
    pub fn compress(
        &self,
        payload: &[u8],
        method: impl Into<MethodRequest>,
        level: i32,
    ) -> Result<(String, CompressionMetadata)> {
        self.compress_with_hint(payload, ContentType::Unknown, method, level)
    }

    /// Compress, letting `hint` steer automatic selection.
    ///
    /// Fails only when `level` is outside `0..=22`.
    pub fn compress_with_hint(
        &self,
        payload: &[u8],
        hint: ContentType,
        method: impl Into<MethodRequest>,
        level: i32,
    ) -> Result<(String, CompressionMetadata)> {
        let level = u32::try_from(level)
            .ok()
            .filter(|l| *l <= MAX_LEVEL)
            .ok_or_else(|| {
                MetaDocError::InvalidArgument(format!(
                    "compression level {level} outside 0..={MAX_LEVEL}"
                ))
            })?;
        Ok(self.compress_checked(payload, hint, method.into(), level))
    }

    /// Automatic selection at the configured default level.
    pub fn compress_auto(&self, payload: &[u8]) -> (String, CompressionMetadata) {
        self.compress_checked(
            payload,
            ContentType::Unknown,
            MethodRequest::Auto,
            self.config.compression.default_level,
        )
    }

    fn compress_checked(
        &self,
        payload: &[u8],
        hint: ContentType,
        request: MethodRequest,
        level: u32,
    ) -> (String, CompressionMetadata) {
        let requested = match request {
            MethodRequest::Auto => {
                let method = self.select_method(payload.len(), hint);
                tracing::debug!(
                    "Selected {method} for {} bytes ({hint:?})",
                    payload.len()
                );
                method
            },
            MethodRequest::Exact(method) => method,
        };

        let start = Instant::now();
        let (method, encoded) = match self.encode_with(requested, payload, level) {
            Ok(encoded) => (requested, encoded),
            Err(e) => {
                tracing::warn!("{requested} failed, falling back to {}: {e}", Method::Raw);
                (Method::Raw, RawCodec::encode_infallible(payload))
            },
        };
        let meta =
            CompressionMetadata::measure(method, payload.len(), &encoded, start.elapsed(), level);

        tracing::debug!(
            "{method}: {} -> {} bytes in {:.3} ms",
            meta.original_size,
            meta.compressed_size,
            meta.processing_time_ms
        );
        self.lock_stats().record(&meta);
        (encoded, meta)
    }

    fn encode_with(&self, method: Method, payload: &[u8], level: u32) -> Result<String> {
        if let Some(backend) = method.backend() {
            if !self.capabilities.is_available(backend) {
                return Err(MetaDocError::BackendUnavailable(backend));
            }
        }

        match method {
            Method::Streaming => StreamingCodec::new(
                PipelineCodec::new(Backend::Gzip, level),
                self.config.streaming.chunk_size,
            )?
            .encode(payload),
            Method::Hybrid => {
                HybridBenchmarker::new(&self.config.hybrid, &self.capabilities, level)
                    .encode(payload)
            },
            leaf => encode_leaf(leaf, payload, level),
        }
    }

    /// Decode an artifact with the metadata produced when it was encoded.
    ///
    /// Dispatch follows `meta.method`. For self-describing methods the
    /// artifact's prefix must name the same method; bare methods must not
    /// carry a prefix.
    pub fn decompress(&self, data: &str, meta: &CompressionMetadata) -> Result<Vec<u8>> {
        let declared = meta.method;
        match (declared.is_self_describing(), detect_method(data)) {
            (_, Some(detected)) if detected != declared => {
                return Err(MetaDocError::MethodMismatch { declared, detected });
            },
            (true, None) => {
                return Err(MetaDocError::MalformedFraming(format!(
                    "{declared} artifact is missing its prefix"
                )));
            },
            _ => {},
        }
        self.decode_with(declared, data)
    }

    /// Decode a self-describing artifact without metadata.
    ///
    /// Bare artifacts are never guessed: they yield `UnsupportedMethod`.
    pub fn decompress_framed(&self, data: &str) -> Result<Vec<u8>> {
        match detect_method(data) {
            Some(method) => self.decode_with(method, data),
            None => Err(MetaDocError::UnsupportedMethod(
                "bare artifact has no method prefix".to_string(),
            )),
        }
    }

    fn decode_with(&self, method: Method, data: &str) -> Result<Vec<u8>> {
        match method {
            Method::Streaming => StreamingCodec::new(
                PipelineCodec::new(Backend::Gzip, self.config.compression.default_level),
                self.config.streaming.chunk_size,
            )?
            .decode(data),
            Method::Hybrid => decode_hybrid(data),
            leaf => decode_leaf(leaf, data),
        }
    }

    /// Snapshot of the running totals
    pub fn stats(&self) -> StatsAccumulator {
        self.lock_stats().clone()
    }

    /// Derived statistics report
    pub fn report(&self) -> CompressionReport {
        self.lock_stats().report()
    }

    // Totals stay consistent even if a recording thread panicked.
    fn lock_stats(&self) -> MutexGuard<'_, StatsAccumulator> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
