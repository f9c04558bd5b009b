//! Base-62 text form of 192-bit identifiers.
//!
//! Digits are `0-9`, then `A-Z`, then `a-z`, which is ASCII order, so
//! encoded strings of equal length sort like the values they encode.

use super::words::{Words192, BYTES};
use crate::error::ErrorKind;

/// Digit alphabet, in ascending value.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Size of the output buffer; no encoded value is longer than this.
pub const MAX_ENCODED_LEN: usize = 50;

const RADIX: u32 = 62;

/// Encode a 192-bit big-endian value.
///
/// The output is a single `'0'` sentinel followed by the digits of the value
/// without leading zeros (zero itself encodes as `"00"`).
pub fn encode(bytes: &[u8; BYTES]) -> String {
    let mut value = Words192::from_bytes(bytes);
    let mut buf = [0u8; MAX_ENCODED_LEN];

    // Remainders come out least significant first, so fill from the back.
    let mut start = buf.len();
    loop {
        let digit = value.div_rem_small(RADIX);
        start -= 1;
        buf[start] = ALPHABET[digit as usize];
        if value.is_zero() {
            break;
        }
    }
    start -= 1;
    buf[start] = b'0';

    buf[start..].iter().map(|&b| char::from(b)).collect()
}

/// Decode base-62 text back into a 192-bit big-endian value.
///
/// Leading zeros (including the sentinel) are accepted.
pub fn decode(text: &str) -> Result<[u8; BYTES], ErrorKind> {
    let invalid = || ErrorKind::InvalidId(text.to_string());
    if text.is_empty() || text.len() > MAX_ENCODED_LEN {
        return Err(invalid());
    }
    let mut value = Words192::ZERO;
    for b in text.bytes() {
        let digit = digit_value(b).ok_or_else(invalid)?;
        value.mul_add_small(RADIX, digit).map_err(|_| invalid())?;
    }
    Ok(value.to_bytes())
}

fn digit_value(b: u8) -> Option<u32> {
    let value = match b {
        b'0'..=b'9' => b - b'0',
        b'A'..=b'Z' => b - b'A' + 10,
        b'a'..=b'z' => b - b'a' + 36,
        _ => return None,
    };
    Some(u32::from(value))
}
