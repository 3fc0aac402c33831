//! Backend compressors used by the pipeline codecs.
//!
//! Backends are black boxes: bytes in, bytes out. gzip, deflate and Brotli
//! are always compiled in; zstd and LZ4 sit behind cargo features and report
//! [`MetaDocError::BackendUnavailable`] when the feature is off.

use std::fmt;
use std::io::{Read, Write};

use brotli::{CompressorWriter, Decompressor};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{MetaDocError, Result};

/// Brotli buffer size
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Window size for Brotli (larger = better compression for large files)
const BROTLI_WINDOW_SIZE: u32 = 22;

/// General-purpose byte compressors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// gzip container (DEFLATE + CRC trailer)
    Gzip,
    /// zlib container
    Deflate,
    /// Brotli
    Brotli,
    /// Zstandard
    Zstd,
    /// LZ4 frame format
    Lz4,
}

impl Backend {
    /// Every backend in enumeration order.
    pub const ALL: [Backend; 5] = [
        Backend::Gzip,
        Backend::Deflate,
        Backend::Brotli,
        Backend::Zstd,
        Backend::Lz4,
    ];

    /// Short name
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Gzip => "gzip",
            Backend::Deflate => "deflate",
            Backend::Brotli => "brotli",
            Backend::Zstd => "zstd",
            Backend::Lz4 => "lz4",
        }
    }

    /// Whether support for this backend was compiled in.
    pub fn is_compiled(&self) -> bool {
        match self {
            Backend::Gzip | Backend::Deflate | Backend::Brotli => true,
            Backend::Zstd => cfg!(feature = "zstd"),
            Backend::Lz4 => cfg!(feature = "lz4"),
        }
    }

    /// Clamp a caller level into this backend's range.
    pub fn clamp_level(&self, level: u32) -> u32 {
        match self {
            Backend::Gzip | Backend::Deflate => level.min(9),
            Backend::Brotli => level.min(11),
            Backend::Zstd => level.clamp(1, 22),
            Backend::Lz4 => level.min(16),
        }
    }

    /// Compress `data` at `level` (clamped).
    pub fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>> {
        let level = self.clamp_level(level);
        match self {
            Backend::Gzip => compress_gzip(data, level),
            Backend::Deflate => compress_deflate(data, level),
            Backend::Brotli => compress_brotli(data, level),
            Backend::Zstd => compress_zstd(data, level),
            Backend::Lz4 => compress_lz4(data, level),
        }
    }

    /// Decompress `data`.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Backend::Gzip => decompress_gzip(data),
            Backend::Deflate => decompress_deflate(data),
            Backend::Brotli => decompress_brotli(data),
            Backend::Zstd => decompress_zstd(data),
            Backend::Lz4 => decompress_lz4(data),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn compression_err(e: std::io::Error) -> MetaDocError {
    MetaDocError::Compression(e.to_string())
}

fn decompression_err(e: std::io::Error) -> MetaDocError {
    MetaDocError::Decompression(e.to_string())
}

fn compress_gzip(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).map_err(compression_err)?;
    encoder.finish().map_err(compression_err)
}

fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut result = Vec::new();
    decoder.read_to_end(&mut result).map_err(decompression_err)?;
    Ok(result)
}

fn compress_deflate(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).map_err(compression_err)?;
    encoder.finish().map_err(compression_err)
}

fn decompress_deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder.read_to_end(&mut result).map_err(decompression_err)?;
    Ok(result)
}

fn compress_brotli(data: &[u8], quality: u32) -> Result<Vec<u8>> {
    let mut compressed = Vec::new();
    {
        let mut writer = CompressorWriter::new(
            &mut compressed,
            BROTLI_BUFFER_SIZE,
            quality,
            BROTLI_WINDOW_SIZE,
        );
        writer.write_all(data).map_err(compression_err)?;
    }
    Ok(compressed)
}

fn decompress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut decompressor = Decompressor::new(data, BROTLI_BUFFER_SIZE);
    let mut decompressed = Vec::new();
    decompressor
        .read_to_end(&mut decompressed)
        .map_err(decompression_err)?;
    Ok(decompressed)
}

#[cfg(feature = "zstd")]
fn compress_zstd(data: &[u8], level: u32) -> Result<Vec<u8>> {
    zstd::encode_all(data, level as i32).map_err(compression_err)
}

#[cfg(not(feature = "zstd"))]
fn compress_zstd(_data: &[u8], _level: u32) -> Result<Vec<u8>> {
    Err(MetaDocError::BackendUnavailable(Backend::Zstd))
}

#[cfg(feature = "zstd")]
fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(decompression_err)
}

#[cfg(not(feature = "zstd"))]
fn decompress_zstd(_data: &[u8]) -> Result<Vec<u8>> {
    Err(MetaDocError::BackendUnavailable(Backend::Zstd))
}

#[cfg(feature = "lz4")]
fn compress_lz4(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = lz4::EncoderBuilder::new()
        .level(level)
        .build(Vec::new())
        .map_err(compression_err)?;
    encoder.write_all(data).map_err(compression_err)?;
    let (compressed, result) = encoder.finish();
    result.map_err(compression_err)?;
    Ok(compressed)
}

#[cfg(not(feature = "lz4"))]
fn compress_lz4(_data: &[u8], _level: u32) -> Result<Vec<u8>> {
    Err(MetaDocError::BackendUnavailable(Backend::Lz4))
}

#[cfg(feature = "lz4")]
fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = lz4::Decoder::new(data).map_err(decompression_err)?;
    let mut result = Vec::new();
    decoder.read_to_end(&mut result).map_err(decompression_err)?;
    Ok(result)
}

#[cfg(not(feature = "lz4"))]
fn decompress_lz4(_data: &[u8]) -> Result<Vec<u8>> {
    Err(MetaDocError::BackendUnavailable(Backend::Lz4))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled() -> impl Iterator<Item = Backend> {
        Backend::ALL.into_iter().filter(Backend::is_compiled)
    }

    #[test]
    fn test_backend_roundtrip() {
        let data = b"Hello, world! This is a test of backend compression.";
        for backend in compiled() {
            let compressed = backend.compress(data, 6).unwrap();
            let decompressed = backend.decompress(&compressed).unwrap();
            assert_eq!(decompressed, data, "{backend}");
        }
    }

    #[test]
    fn test_backend_empty_input() {
        for backend in compiled() {
            let compressed = backend.compress(b"", 6).unwrap();
            assert!(backend.decompress(&compressed).unwrap().is_empty(), "{backend}");
        }
    }

    #[test]
    fn test_repetitive_data_shrinks() {
        let data = "abcabcabc".repeat(500);
        for backend in compiled() {
            let compressed = backend.compress(data.as_bytes(), 6).unwrap();
            assert!(compressed.len() < data.len() / 4, "{backend}");
        }
    }

    #[test]
    fn test_garbage_fails_to_decompress() {
        let garbage = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x11];
        for backend in [Backend::Gzip, Backend::Deflate] {
            assert!(matches!(
                backend.decompress(&garbage),
                Err(MetaDocError::Decompression(_))
            ));
        }
    }

    #[test]
    fn test_level_clamping() {
        assert_eq!(Backend::Gzip.clamp_level(22), 9);
        assert_eq!(Backend::Brotli.clamp_level(22), 11);
        assert_eq!(Backend::Zstd.clamp_level(0), 1);
        assert_eq!(Backend::Lz4.clamp_level(3), 3);
    }

    #[cfg(not(feature = "zstd"))]
    #[test]
    fn test_missing_feature_reports_unavailable() {
        assert!(matches!(
            Backend::Zstd.compress(b"x", 3),
            Err(MetaDocError::BackendUnavailable(Backend::Zstd))
        ));
    }
}
