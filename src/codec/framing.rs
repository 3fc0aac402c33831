//! Wire-format grammar for self-describing artifacts.
//!
//! ```text
//! "Z85:"    <padding 0-3> ":" <base85-digits>
//! "B91:"    <base91-symbols>
//! "STREAM:" <count> ":" <chunk> ("|" <chunk>)*
//! "HYBRID:" <method-name> ":" <winning-artifact>
//! ```
//!
//! Anything without one of these prefixes is a bare artifact (backend
//! pipeline or raw fallback output) and can only be decoded with an
//! externally supplied method. Encoders write frames through the `write_*`
//! helpers and decoders read them through [`Frame::parse`], so both sides
//! share one grammar.

use super::Method;
use crate::error::{MetaDocError, Result};

/// Prefix of base-85 artifacts
pub const Z85_PREFIX: &str = "Z85:";
/// Prefix of base-91 artifacts
pub const BASE91_PREFIX: &str = "B91:";
/// Prefix of streaming artifacts
pub const STREAM_PREFIX: &str = "STREAM:";
/// Prefix of hybrid artifacts
pub const HYBRID_PREFIX: &str = "HYBRID:";
/// Separator between streaming chunks
pub const CHUNK_SEPARATOR: char = '|';

/// Largest valid Z85 padding count
const MAX_Z85_PADDING: usize = 3;

/// A parsed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Base-85 digits plus the number of zero bytes to trim
    Z85 {
        /// Trailing pad bytes (0-3)
        padding: usize,
        /// Digit string, five digits per group
        digits: &'a str,
    },
    /// Base-91 symbols
    Base91 {
        /// Symbol string
        symbols: &'a str,
    },
    /// Independently encoded chunks, count already verified
    Stream {
        /// Chunks in payload order
        chunks: Vec<&'a str>,
    },
    /// Winning hybrid candidate
    Hybrid {
        /// Leaf method that produced `artifact`
        method: Method,
        /// Candidate output
        artifact: &'a str,
    },
    /// No recognized prefix
    Bare(&'a str),
}

impl<'a> Frame<'a> {
    /// Parse an artifact.
    pub fn parse(input: &'a str) -> Result<Self> {
        if let Some(rest) = input.strip_prefix(Z85_PREFIX) {
            parse_z85(rest)
        } else if let Some(rest) = input.strip_prefix(BASE91_PREFIX) {
            Ok(Frame::Base91 { symbols: rest })
        } else if let Some(rest) = input.strip_prefix(STREAM_PREFIX) {
            parse_stream(rest)
        } else if let Some(rest) = input.strip_prefix(HYBRID_PREFIX) {
            parse_hybrid(rest)
        } else {
            Ok(Frame::Bare(input))
        }
    }

    /// Method identified by the prefix, `None` for bare artifacts.
    pub fn method(&self) -> Option<Method> {
        match self {
            Frame::Z85 { .. } => Some(Method::Z85),
            Frame::Base91 { .. } => Some(Method::Base91),
            Frame::Stream { .. } => Some(Method::Streaming),
            Frame::Hybrid { .. } => Some(Method::Hybrid),
            Frame::Bare(_) => None,
        }
    }
}

/// Method named by the artifact's prefix, without validating the rest.
pub fn detect_method(input: &str) -> Option<Method> {
    if input.starts_with(Z85_PREFIX) {
        Some(Method::Z85)
    } else if input.starts_with(BASE91_PREFIX) {
        Some(Method::Base91)
    } else if input.starts_with(STREAM_PREFIX) {
        Some(Method::Streaming)
    } else if input.starts_with(HYBRID_PREFIX) {
        Some(Method::Hybrid)
    } else {
        None
    }
}

/// Plain ASCII digits only; `usize::from_str` would also take a leading `+`.
fn parse_decimal(field: &str) -> Option<usize> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn parse_z85(rest: &str) -> Result<Frame<'_>> {
    let (padding, digits) = rest
        .split_once(':')
        .ok_or_else(|| MetaDocError::MalformedFraming("Z85 frame missing padding field".into()))?;
    let padding = parse_decimal(padding).ok_or_else(|| {
        MetaDocError::MalformedFraming(format!("Z85 padding is not a number: {padding:?}"))
    })?;
    if padding > MAX_Z85_PADDING {
        return Err(MetaDocError::MalformedFraming(format!(
            "Z85 padding out of range: {padding}"
        )));
    }
    Ok(Frame::Z85 { padding, digits })
}

fn parse_stream(rest: &str) -> Result<Frame<'_>> {
    let (count, body) = rest
        .split_once(':')
        .ok_or_else(|| MetaDocError::MalformedFraming("STREAM frame missing chunk count".into()))?;
    let declared = parse_decimal(count).ok_or_else(|| {
        MetaDocError::MalformedFraming(format!("STREAM chunk count is not a number: {count:?}"))
    })?;

    let chunks: Vec<&str> = if body.is_empty() {
        Vec::new()
    } else {
        body.split(CHUNK_SEPARATOR).collect()
    };

    if chunks.len() != declared {
        return Err(MetaDocError::ChunkCountMismatch {
            declared,
            actual: chunks.len(),
        });
    }
    Ok(Frame::Stream { chunks })
}

fn parse_hybrid(rest: &str) -> Result<Frame<'_>> {
    let (name, artifact) = rest
        .split_once(':')
        .ok_or_else(|| MetaDocError::MalformedFraming("HYBRID frame missing method name".into()))?;
    let method: Method = name.parse()?;
    if method.is_wrapper() {
        return Err(MetaDocError::MalformedFraming(format!(
            "HYBRID frame cannot wrap {method}"
        )));
    }
    Ok(Frame::Hybrid { method, artifact })
}

/// `Z85:<padding>:<digits>`
pub fn write_z85(padding: usize, digits: &str) -> String {
    format!("{Z85_PREFIX}{padding}:{digits}")
}

/// `B91:<symbols>`
pub fn write_base91(symbols: &str) -> String {
    format!("{BASE91_PREFIX}{symbols}")
}

/// `STREAM:<count>:<chunk>|<chunk>...`
pub fn write_stream(chunks: &[String]) -> String {
    let body_len: usize = chunks.iter().map(|c| c.len() + 1).sum();
    let mut out = String::with_capacity(STREAM_PREFIX.len() + 12 + body_len);
    out.push_str(STREAM_PREFIX);
    out.push_str(&chunks.len().to_string());
    out.push(':');
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            out.push(CHUNK_SEPARATOR);
        }
        out.push_str(chunk);
    }
    out
}

/// `HYBRID:<method>:<artifact>`
pub fn write_hybrid(method: Method, artifact: &str) -> String {
    format!("{HYBRID_PREFIX}{method}:{artifact}")
}
