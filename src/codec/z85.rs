//! Base-85 codec (`Z85:` framing).
//!
//! The payload is zero-padded to a multiple of four bytes. Each big-endian
//! 32-bit group becomes five digits, most significant first. The pad count
//! is recorded in the frame so decoding can trim exactly that many bytes.
//!
//! ```text
//! Z85:<padding>:<digits>
//! ```
//!
//! No compression is applied: this codec targets already-compressed media,
//! where it costs 25% overhead instead of base64's 33%.

use super::framing::{self, Frame};
use super::Codec;
use crate::error::{MetaDocError, Result};

/// ZeroMQ Z85 alphabet
pub const ALPHABET: &[u8; 85] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.-:+=^!/*?&<>()[]{}@%$#";

const GROUP_BYTES: usize = 4;
const GROUP_DIGITS: usize = 5;
const INVALID: u8 = 0xff;

/// Digit value per ASCII byte, `INVALID` outside the alphabet.
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

/// Base-85 text codec
#[derive(Debug, Clone, Copy, Default)]
pub struct Z85Codec;

/// Zero bytes needed to reach a multiple of four.
pub fn padding_for(len: usize) -> usize {
    (GROUP_BYTES - len % GROUP_BYTES) % GROUP_BYTES
}

impl Codec for Z85Codec {
    fn encode(&self, data: &[u8]) -> Result<String> {
        let padding = padding_for(data.len());
        let groups = (data.len() + padding) / GROUP_BYTES;
        let mut digits = String::with_capacity(groups * GROUP_DIGITS);

        let mut chunks = data.chunks_exact(GROUP_BYTES);
        for chunk in chunks.by_ref() {
            push_group(&mut digits, u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        let tail = chunks.remainder();
        if !tail.is_empty() {
            let mut group = [0u8; GROUP_BYTES];
            group[..tail.len()].copy_from_slice(tail);
            push_group(&mut digits, u32::from_be_bytes(group));
        }

        Ok(framing::write_z85(padding, &digits))
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>> {
        let (padding, digits) = match Frame::parse(text)? {
            Frame::Z85 { padding, digits } => (padding, digits),
            _ => {
                return Err(MetaDocError::MalformedFraming(
                    "expected Z85 frame".to_string(),
                ))
            },
        };

        let digits = digits.as_bytes();
        if digits.len() % GROUP_DIGITS != 0 {
            return Err(MetaDocError::MalformedFraming(format!(
                "Z85 digit count {} is not a multiple of {GROUP_DIGITS}",
                digits.len()
            )));
        }

        let mut out = Vec::with_capacity(digits.len() / GROUP_DIGITS * GROUP_BYTES);
        for group in digits.chunks_exact(GROUP_DIGITS) {
            let mut value: u64 = 0;
            for &c in group {
                let digit = DECODE_TABLE[c as usize];
                if digit == INVALID {
                    return Err(MetaDocError::MalformedFraming(format!(
                        "invalid Z85 digit {:?}",
                        c as char
                    )));
                }
                value = value * 85 + u64::from(digit);
            }
            let value = u32::try_from(value).map_err(|_| {
                MetaDocError::MalformedFraming("Z85 group exceeds 32 bits".to_string())
            })?;
            out.extend_from_slice(&value.to_be_bytes());
        }

        if padding > out.len() {
            return Err(MetaDocError::MalformedFraming(format!(
                "Z85 padding {padding} exceeds decoded length {}",
                out.len()
            )));
        }
        out.truncate(out.len() - padding);
        Ok(out)
    }
}

fn push_group(out: &mut String, mut value: u32) {
    let mut group = [0u8; GROUP_DIGITS];
    for slot in group.iter_mut().rev() {
        *slot = ALPHABET[(value % 85) as usize];
        value /= 85;
    }
    for &b in &group {
        out.push(b as char);
    }
}
