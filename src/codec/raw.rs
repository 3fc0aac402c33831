//! Raw fallback: plain base64, no compression, no prefix.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::Codec;
use crate::error::Result;

/// Last-resort codec. Encoding cannot fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl RawCodec {
    /// Infallible encode used by the fallback chain.
    pub fn encode_infallible(data: &[u8]) -> String {
        BASE64.encode(data)
    }
}

impl Codec for RawCodec {
    fn encode(&self, data: &[u8]) -> Result<String> {
        Ok(Self::encode_infallible(data))
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>> {
        Ok(BASE64.decode(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        let encoded = RawCodec.encode(b"Hello").unwrap();
        assert_eq!(encoded, "SGVsbG8=");
        assert_eq!(RawCodec.decode(&encoded).unwrap(), b"Hello");
        assert_eq!(RawCodec.encode(b"").unwrap(), "");
    }
}
