use core::fmt;
use heapless::Vec;

/// Parse a single ASCII hex digit. Unlike `u8::from_str_radix`, signs and
/// whitespace are rejected.
const fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse the hex digit pair starting at `index` in `s`.
pub(crate) fn byte_at(s: &[u8], index: usize) -> Result<u8, DecodeHexError> {
    let hi = s.get(index).ok_or(DecodeHexError::OddLength)?;
    let lo = s.get(index + 1).ok_or(DecodeHexError::OddLength)?;
    let hi = nibble(*hi).ok_or(DecodeHexError::InvalidDigit { index })?;
    let lo = nibble(*lo).ok_or(DecodeHexError::InvalidDigit { index: index + 1 })?;
    Ok((hi << 4) | lo)
}

/// Iterate over the bytes encoded by a string of hex digit pairs.
///
/// The length is validated up front, so the iterator only ever fails on a
/// non-hex digit.
pub(crate) fn bytes(
    s: &str,
) -> Result<impl Iterator<Item = Result<u8, DecodeHexError>> + '_, DecodeHexError> {
    if s.len() % 2 != 0 {
        return Err(DecodeHexError::OddLength);
    }
    let raw = s.as_bytes();
    Ok((0..raw.len()).step_by(2).map(move |i| byte_at(raw, i)))
}

pub fn decode_hex<const L: usize>(s: &str) -> Result<Vec<u8, L>, DecodeHexError> {
    let mut out = Vec::new();
    for b in bytes(s)? {
        out.push(b?).map_err(|_| DecodeHexError::Overflow)?;
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeHexError {
    /// Input holds an odd number of hex digits
    OddLength,
    /// Input ends in the middle of a multi-byte code unit
    TruncatedUnit,
    /// Character at `index` is not a hex digit
    InvalidDigit { index: usize },
    /// Decoded output does not fit in the destination buffer
    Overflow,
}

impl fmt::Display for DecodeHexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeHexError::OddLength => f.write_str("input string has an odd number of bytes"),
            DecodeHexError::TruncatedUnit => f.write_str("input string ends inside a code unit"),
            DecodeHexError::InvalidDigit { index } => {
                write!(f, "invalid hex digit at index {}", index)
            }
            DecodeHexError::Overflow => f.write_str("decoded output exceeds buffer capacity"),
        }
    }
}
