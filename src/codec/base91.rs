//! Base-91 codec (`B91:` framing).
//!
//! Bits are packed LSB-first into an accumulator. Whenever it holds more than
//! 13 bits, the low 13 bits form one group, written as two symbols
//! (`value % 91`, `value / 91`). At end of input the leftover group is
//! flushed: a single symbol when it carries at most 6 bits, a pair otherwise.
//!
//! Decoding ORs 13 bits per symbol pair into the accumulator and emits a byte
//! whenever 8 or more bits are held. A trailing single symbol completes the
//! final byte. Symbols outside the alphabet are skipped, so whitespace or
//! line breaks inserted by text containers do not break decoding (this also
//! means corruption that injects foreign characters goes unnoticed).

use super::framing::{self, Frame};
use super::Codec;
use crate::error::{MetaDocError, Result};

/// basE91 alphabet
pub const ALPHABET: &[u8; 91] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!#$%&()*+,./:;<=>?@[]^_`{|}~\"";

/// Bits per group
pub const GROUP_BITS: u32 = 13;

const GROUP_MASK: u32 = (1 << GROUP_BITS) - 1;

/// Widest leftover that still fits a single symbol (2^6 = 64 < 91).
const SINGLE_SYMBOL_BITS: u32 = 6;

const INVALID: u8 = 0xff;

const DECODE_TABLE: [u8; 256] = build_decode_table();

const fn build_decode_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Base-91 text codec
#[derive(Debug, Clone, Copy, Default)]
pub struct Base91Codec;

impl Base91Codec {
    /// Number of 13-bit groups in an encoded symbol string.
    pub fn group_count(symbols: &str) -> usize {
        let valid = symbols
            .bytes()
            .filter(|&b| DECODE_TABLE[b as usize] != INVALID)
            .count();
        valid.div_ceil(2)
    }
}

impl Codec for Base91Codec {
    fn encode(&self, data: &[u8]) -> Result<String> {
        let mut symbols = String::with_capacity(data.len() * 16 / 13 + 2);
        let mut acc: u32 = 0;
        let mut bits: u32 = 0;

        for &byte in data {
            acc |= u32::from(byte) << bits;
            bits += 8;
            if bits > GROUP_BITS {
                push_pair(&mut symbols, acc & GROUP_MASK);
                acc >>= GROUP_BITS;
                bits -= GROUP_BITS;
            }
        }

        if bits > 0 {
            if bits <= SINGLE_SYMBOL_BITS {
                symbols.push(ALPHABET[acc as usize] as char);
            } else {
                push_pair(&mut symbols, acc);
            }
        }

        Ok(framing::write_base91(&symbols))
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>> {
        let symbols = match Frame::parse(text)? {
            Frame::Base91 { symbols } => symbols,
            _ => {
                return Err(MetaDocError::MalformedFraming(
                    "expected B91 frame".to_string(),
                ))
            },
        };

        let values: Vec<u32> = symbols
            .bytes()
            .map(|b| DECODE_TABLE[b as usize])
            .filter(|&v| v != INVALID)
            .map(u32::from)
            .collect();

        let mut out = Vec::with_capacity(values.len() * 13 / 16 + 1);
        let mut acc: u32 = 0;
        let mut bits: u32 = 0;

        let mut pairs = values.chunks_exact(2);
        for pair in pairs.by_ref() {
            let value = pair[0] + pair[1] * 91;
            if value > GROUP_MASK {
                return Err(MetaDocError::MalformedFraming(format!(
                    "B91 group value {value} exceeds 13 bits"
                )));
            }
            acc |= value << bits;
            bits += GROUP_BITS;
            while bits >= 8 {
                out.push(acc as u8);
                acc >>= 8;
                bits -= 8;
            }
        }

        if let [last] = pairs.remainder() {
            out.push((acc | (last << bits)) as u8);
        }

        Ok(out)
    }
}

fn push_pair(out: &mut String, value: u32) {
    out.push(ALPHABET[(value % 91) as usize] as char);
    out.push(ALPHABET[(value / 91) as usize] as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_small() {
        for data in [&b""[..], b"a", b"ab", b"abc", b"Hello, World!"] {
            let encoded = Base91Codec.encode(data).unwrap();
            assert!(encoded.starts_with("B91:"));
            assert_eq!(Base91Codec.decode(&encoded).unwrap(), data);
        }
    }

    #[test]
    fn test_known_encoding() {
        assert_eq!(Base91Codec.encode(b"Hello").unwrap(), "B91:>OwJh>A");
    }

    #[test]
    fn test_single_symbol_flush() {
        // 2 bytes = 16 bits: one 13-bit group, 3 leftover bits -> one symbol
        let encoded = Base91Codec.encode(&[0xff, 0xff]).unwrap();
        assert_eq!(encoded.len(), "B91:".len() + 3);
        assert_eq!(Base91Codec.decode(&encoded).unwrap(), [0xff, 0xff]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(Base91Codec.encode(b"").unwrap(), "B91:");
        assert!(Base91Codec.decode("B91:").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_symbols_are_skipped() {
        let encoded = Base91Codec.encode(b"Hello, World!").unwrap();
        let (prefix, symbols) = encoded.split_at(4);
        let noisy: String = symbols
            .chars()
            .flat_map(|c| [c, ' ', '\n'])
            .collect();
        let decoded = Base91Codec.decode(&format!("{prefix}{noisy}")).unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_group_count_bounds() {
        for n in 0..64usize {
            let data: Vec<u8> = (0..n).map(|i| (i * 37) as u8).collect();
            let encoded = Base91Codec.encode(&data).unwrap();
            let groups = Base91Codec::group_count(&encoded[4..]);
            let lower = (8 * n).div_ceil(13);
            assert!(groups >= lower && groups <= lower + 1, "n={n}");
        }
    }

    #[test]
    fn test_out_of_range_group() {
        // '"' is the last symbol: 90 + 90 * 91 = 8280 > 8191
        assert!(matches!(
            Base91Codec.decode("B91:\"\""),
            Err(MetaDocError::MalformedFraming(_))
        ));
    }

    #[test]
    fn test_wrong_frame() {
        assert!(matches!(
            Base91Codec.decode("Z85:0:"),
            Err(MetaDocError::MalformedFraming(_))
        ));
    }
}
