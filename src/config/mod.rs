//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`METADOC_*`, applied over the file)
//!
//! Every section has defaults matching the built-in design constants, so an
//! empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::{Backend, DEFAULT_CHUNK_SIZE, DEFAULT_LEVEL};
use crate::error::{MetaDocError, Result};

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

/// Highest level accepted by any backend (zstd)
pub const MAX_LEVEL: u32 = 22;

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Method selector thresholds
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Streaming chunker settings
    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Hybrid benchmarker settings
    #[serde(default)]
    pub hybrid: HybridConfig,

    /// Backend availability overrides
    #[serde(default)]
    pub backends: BackendConfig,

    /// Compression defaults
    #[serde(default)]
    pub compression: CompressionConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MetaDocError::Config(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| MetaDocError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Default config file location (`<config_dir>/metadoc/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("metadoc").join("config.toml"))
    }

    /// Load the default config file if it exists, then apply the environment.
    pub fn load() -> Result<Self> {
        let base = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `METADOC_*` environment variables. Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("METADOC_DEFAULT_LEVEL") {
            if let Ok(level) = val.parse() {
                self.compression.default_level = level;
            }
        }
        if let Ok(val) = std::env::var("METADOC_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                self.streaming.chunk_size = size;
            }
        }
        if let Ok(val) = std::env::var("METADOC_HYBRID_PARALLEL") {
            if let Ok(parallel) = val.parse() {
                self.hybrid.parallel = parallel;
            }
        }
        if let Ok(val) = std::env::var("METADOC_HYBRID_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                self.hybrid.candidate_timeout_ms = Some(ms);
            }
        }
        if let Ok(val) = std::env::var("METADOC_DISABLED_BACKENDS") {
            self.backends.disabled = parse_backend_list(&val);
        }
        self
    }

    /// Check invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.streaming.chunk_size == 0 {
            return Err(MetaDocError::Config(
                "streaming.chunk_size must be positive".to_string(),
            ));
        }
        if self.compression.default_level > MAX_LEVEL {
            return Err(MetaDocError::Config(format!(
                "compression.default_level must be at most {MAX_LEVEL}"
            )));
        }
        let weights = [self.hybrid.size_weight, self.hybrid.time_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || weights.iter().sum::<f64>() <= 0.0
        {
            return Err(MetaDocError::Config(
                "hybrid weights must be non-negative and not both zero".to_string(),
            ));
        }
        if self.backends.disabled.contains(&Backend::Gzip) {
            return Err(MetaDocError::Config(
                "gzip is the fallback backend and cannot be disabled".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_backend_list(list: &str) -> Vec<Backend> {
    list.split(',')
        .map(str::trim)
        .filter_map(|name| Backend::ALL.into_iter().find(|b| b.name() == name))
        .collect()
}

/// Method selector thresholds (bytes). Rules are applied in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Above this size, use the streaming wrapper
    pub streaming_threshold: usize,
    /// Media above this size goes to base-85 untouched
    pub media_threshold: usize,
    /// Text above this size prefers the high-ratio backend
    pub high_ratio_threshold: usize,
    /// Below this size, prefer the fastest backend
    pub small_threshold: usize,
    /// Below this size, use the balanced backend; above, hybrid
    pub medium_threshold: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            streaming_threshold: 10 * MIB,
            media_threshold: 100 * KIB,
            high_ratio_threshold: MIB,
            small_threshold: 100 * KIB,
            medium_threshold: MIB,
        }
    }
}

/// Streaming chunker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Fixed chunk size in bytes
    pub chunk_size: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Hybrid benchmarker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Weight of the encoded size (bytes) in the score denominator
    pub size_weight: f64,
    /// Weight of the elapsed time (ms) in the score denominator
    pub time_weight: f64,
    /// Try base-85 below this size
    pub z85_threshold: usize,
    /// Try the fast backend below this size
    pub fast_backend_threshold: usize,
    /// Fan candidates out on the rayon pool (`parallel` feature)
    pub parallel: bool,
    /// Drop candidates that take longer than this
    pub candidate_timeout_ms: Option<u64>,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            size_weight: 0.8,
            time_weight: 0.2,
            z85_threshold: 100 * KIB,
            fast_backend_threshold: MIB,
            parallel: false,
            candidate_timeout_ms: None,
        }
    }
}

/// Backend availability overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backends treated as unavailable even when compiled in
    pub disabled: Vec<Backend>,
}

/// Compression defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Level used by `compress_auto`
    pub default_level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_LEVEL,
        }
    }
}
