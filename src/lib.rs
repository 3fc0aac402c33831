//! # MetaDoc - Adaptive Binary-to-Text Encoding
//!
//! Turns arbitrary byte payloads into text-safe strings that can be embedded
//! in HTML or JSON containers and reconstructed losslessly later.
//!
//! ## Features
//!
//! - **Backend pipelines**: gzip, deflate, Brotli, zstd and LZ4, then base64
//! - **Custom text codecs**: base-85 (`Z85:`) and base-91 (`B91:`), no compressor needed
//! - **Streaming**: fixed-size chunking for payloads over 10 MiB
//! - **Hybrid mode**: benchmark several codecs and keep the best
//! - **Fallback chain**: `compress` always returns a usable string
//! - **Statistics**: running totals and a derived report per engine
//!
//! ## Wire Formats
//!
//! | Method          | Wire Format                    | Self-describing |
//! |-----------------|--------------------------------|-----------------|
//! | Base-85         | `Z85:<pad>:<digits>`           | yes             |
//! | Base-91         | `B91:<symbols>`                | yes             |
//! | Streaming       | `STREAM:<n>:<c1>\|<c2>...`     | yes             |
//! | Hybrid          | `HYBRID:<method>:<artifact>`   | yes             |
//! | Backend / raw   | bare base64                    | **no**          |
//!
//! Bare artifacts carry no prefix. Keep the [`CompressionMetadata`] returned
//! by `compress`: decoding them requires its `method`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metadoc::{CompressionEngine, ContentType, Method, MethodRequest};
//!
//! let engine = CompressionEngine::new();
//!
//! // Explicit codec
//! let (text, meta) = engine.compress(b"Hello, World!", Method::Z85, 6)?;
//! assert!(text.starts_with("Z85:"));
//! assert_eq!(engine.decompress(&text, &meta)?, b"Hello, World!");
//!
//! // Automatic selection, steered by a content-type hint
//! let (text, meta) =
//!     engine.compress_with_hint(&pdf_bytes, ContentType::DocumentText, MethodRequest::Auto, 6)?;
//! println!("{} saved {} bytes", meta.method, meta.space_saved);
//!
//! // Running statistics
//! println!("{}", serde_json::to_string_pretty(&engine.report())?);
//! ```
//!
//! ## Method Selection
//!
//! First match wins:
//!
//! 1. over 10 MiB: streaming
//! 2. image/video/audio over 100 KiB: base-85
//! 3. text: zstd over 1 MiB, else Brotli, else gzip
//! 4. under 100 KiB: LZ4, else base-85
//! 5. under 1 MiB: gzip
//! 6. otherwise: hybrid
//!
//! ## Modules
//!
//! - [`codec`]: Codecs, selector, hybrid benchmarker and engine
//! - [`stats`]: Running totals and reports
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod codec;
pub mod config;
pub mod error;
pub mod stats;

// Re-exports for convenience
pub use codec::{
    Backend, CapabilitySet, Codec, CompressionEngine, CompressionMetadata, ContentType, Method,
    MethodRequest,
};
pub use config::Config;
pub use error::{MetaDocError, Result};
pub use stats::{CompressionReport, StatsAccumulator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Detect the method of a self-describing artifact from its prefix
pub fn detect_method(content: &str) -> Option<Method> {
    codec::detect_method(content)
}
