//! Decoding of hex encoded messaging payloads (SMS and USSD text).
//!
//! Modems in text mode hand out message bodies as strings of hex digit pairs.
//! Depending on the data coding scheme these pairs carry 7-bit GSM septets
//! packed across octet boundaries, plain 8-bit characters, or big-endian UCS2
//! code units. Decoded output is single-byte text: every decoded byte `b` is
//! stored as the character `U+00bb`.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::hex::{self, DecodeHexError};

/// What to emit for a UCS2 code unit whose high byte is non-zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnicodeFallback {
    /// A single `?`
    #[default]
    Placeholder,
    /// `\x` followed by the four original hex digits, e.g. `\x0417`
    HexEscape,
}

/// Text encoding of a hex payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextEncoding {
    Gsm7Bit,
    EightBit,
    Ucs2,
}

impl TextEncoding {
    /// Map a USSD/SMS data coding scheme to an encoding this module can
    /// decode.
    pub const fn from_dcs(dcs: u8) -> Option<Self> {
        match dcs {
            15 => Some(Self::Gsm7Bit),
            68 => Some(Self::EightBit),
            72 => Some(Self::Ucs2),
            _ => None,
        }
    }
}

/// Decode `hex` with the given `encoding`.
pub fn decode_text<const N: usize>(
    hex: &str,
    encoding: TextEncoding,
    fallback: UnicodeFallback,
) -> Result<String<N>, DecodeHexError> {
    match encoding {
        TextEncoding::Gsm7Bit => decode_7bit(hex),
        TextEncoding::EightBit => decode_8bit(hex),
        TextEncoding::Ucs2 => decode_16bit(hex, fallback),
    }
}

fn push<const N: usize>(out: &mut String<N>, b: u8) -> Result<(), DecodeHexError> {
    out.push(char::from(b))
        .map_err(|_| DecodeHexError::Overflow)
}

fn push_str<const N: usize>(out: &mut String<N>, s: &str) -> Result<(), DecodeHexError> {
    out.push_str(s).map_err(|_| DecodeHexError::Overflow)
}

/// Unpack GSM 03.38 default alphabet septets, eight of which are packed into
/// every seven octets.
///
/// Septet values are emitted as-is; no alphabet translation is applied. Every
/// seventh octet completes an extra septet, so it produces two characters.
pub fn decode_7bit<const N: usize>(hex: &str) -> Result<String<N>, DecodeHexError> {
    let mut out = String::new();
    let mut remainder: u8 = 0;
    let mut bit_state: u8 = 7;

    for b in hex::bytes(hex)? {
        let b = b?;
        let shifted = b << (7 - bit_state);
        push(&mut out, shifted.wrapping_add(remainder) & 0x7F)?;
        remainder = b >> bit_state;
        bit_state -= 1;
        if bit_state == 0 {
            push(&mut out, remainder)?;
            remainder = 0;
            bit_state = 7;
        }
    }

    Ok(out)
}

/// One character per hex digit pair.
pub fn decode_8bit<const N: usize>(hex: &str) -> Result<String<N>, DecodeHexError> {
    let mut out = String::new();
    for b in hex::bytes(hex)? {
        push(&mut out, b?)?;
    }
    Ok(out)
}

/// Big-endian UCS2, four hex digits per code unit.
///
/// Code units above `U+00FF` cannot be represented in single-byte output and
/// are replaced according to `fallback`. The low byte is kept otherwise.
pub fn decode_16bit<const N: usize>(
    hex: &str,
    fallback: UnicodeFallback,
) -> Result<String<N>, DecodeHexError> {
    let raw = hex.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(DecodeHexError::OddLength);
    }
    if raw.len() % 4 != 0 {
        return Err(DecodeHexError::TruncatedUnit);
    }

    let mut out = String::new();
    for i in (0..raw.len()).step_by(4) {
        let high = hex::byte_at(raw, i)?;
        let low = hex::byte_at(raw, i + 2)?;
        if high == 0 {
            push(&mut out, low)?;
            continue;
        }

        trace!("Unrepresentable code unit {:?}", &hex[i..i + 4]);
        match fallback {
            UnicodeFallback::Placeholder => push(&mut out, b'?')?,
            UnicodeFallback::HexEscape => {
                push_str(&mut out, "\\x")?;
                push_str(&mut out, &hex[i..i + 4])?;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_bit() {
        assert_eq!(decode_8bit::<16>("414243").unwrap(), "ABC");
        assert_eq!(decode_8bit::<16>("").unwrap(), "");
    }

    #[test]
    fn eight_bit_high_bytes_map_to_latin1() {
        let s = decode_8bit::<16>("E9").unwrap();
        assert_eq!(s.chars().next(), Some('\u{e9}'));
    }

    #[test]
    fn sixteen_bit_ascii_subset() {
        assert_eq!(
            decode_16bit::<16>("00410042", UnicodeFallback::default()).unwrap(),
            "AB"
        );
    }

    #[test]
    fn sixteen_bit_placeholder_by_default() {
        assert_eq!(
            decode_16bit::<16>("04170430", UnicodeFallback::default()).unwrap(),
            "??"
        );
    }

    #[test]
    fn sixteen_bit_hex_escape() {
        assert_eq!(
            decode_16bit::<32>("04170430", UnicodeFallback::HexEscape).unwrap(),
            "\\x0417\\x0430"
        );
        assert_eq!(
            decode_16bit::<32>("0048041f0069", UnicodeFallback::HexEscape).unwrap(),
            "H\\x041fi"
        );
    }

    #[test]
    fn sixteen_bit_rejects_partial_unit() {
        assert_eq!(
            decode_16bit::<16>("004100", UnicodeFallback::default()),
            Err(DecodeHexError::TruncatedUnit)
        );
        assert_eq!(
            decode_16bit::<16>("00410", UnicodeFallback::default()),
            Err(DecodeHexError::OddLength)
        );
        assert_eq!(
            decode_16bit::<16>("00Z1", UnicodeFallback::default()),
            Err(DecodeHexError::InvalidDigit { index: 2 })
        );
    }

    #[test]
    fn seven_bit_packed() {
        assert_eq!(
            decode_7bit::<16>("E8329BFD4697D9EC37").unwrap(),
            "hellohello"
        );
        assert_eq!(
            decode_7bit::<16>("C8329BFD065DDF723619").unwrap(),
            "Hello World"
        );
    }

    #[test]
    fn seven_bit_extra_character_on_seventh_octet() {
        // Seven octets carry eight septets.
        assert_eq!(decode_7bit::<16>("41E19058341E91").unwrap(), "ABCDEFGH");

        // Seven septets padded to seven octets leave a zero septet behind.
        let s = decode_7bit::<16>("41E19058341E01").unwrap();
        assert_eq!(s.len(), 8);
        assert_eq!(&s[..7], "ABCDEFG");
        assert_eq!(s.as_bytes()[7], 0);

        // Six octets never reach the boundary.
        assert_eq!(decode_7bit::<16>("41E19058341E").unwrap().len(), 6);
    }

    #[test]
    fn malformed_input_fails() {
        assert_eq!(decode_7bit::<16>("E83"), Err(DecodeHexError::OddLength));
        assert_eq!(
            decode_8bit::<16>("41x2"),
            Err(DecodeHexError::InvalidDigit { index: 2 })
        );
    }

    #[test]
    fn output_overflow() {
        assert_eq!(decode_8bit::<2>("414243"), Err(DecodeHexError::Overflow));
    }

    #[test]
    fn dispatch_by_dcs() {
        let enc = TextEncoding::from_dcs(15).unwrap();
        assert_eq!(
            decode_text::<16>("E8329BFD4697D9EC37", enc, UnicodeFallback::default()).unwrap(),
            "hellohello"
        );
        let enc = TextEncoding::from_dcs(72).unwrap();
        assert_eq!(
            decode_text::<16>("00410042", enc, UnicodeFallback::default()).unwrap(),
            "AB"
        );
        assert_eq!(TextEncoding::from_dcs(68), Some(TextEncoding::EightBit));
        assert_eq!(TextEncoding::from_dcs(0), None);
    }
}
