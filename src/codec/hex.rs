//! Hex string primitives.
//!
//! All parsing goes through the alphabet patterns below first, so inputs such
//! as `"+1F"` or `" 1F"` that `from_str_radix` would tolerate are rejected.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FormatError;

/// Default chunk width for obfuscated payloads (4 bytes).
pub const CHUNK_SIZE: usize = 8;

lazy_static! {
    /// Purely decimal digits
    static ref DECIMAL_PATTERN: Regex = Regex::new(r"^[0-9]+$").unwrap();

    /// Hex alphabet, either case
    static ref HEX_PATTERN: Regex = Regex::new(r"^[0-9A-Fa-f]+$").unwrap();
}

/// True if `value` is non-empty and consists only of `0-9`.
pub fn is_decimal(value: &str) -> bool {
    DECIMAL_PATTERN.is_match(value)
}

/// True if `value` is non-empty and consists only of hex digits.
pub fn is_hex(value: &str) -> bool {
    HEX_PATTERN.is_match(value)
}

/// Split a string into `chunk_size` slices, left to right.
///
/// The final chunk is shorter when the length is not a multiple of
/// `chunk_size`. Callers that need whole chunks check the length themselves.
///
/// # Examples
/// ```
/// use genvolt_core::codec::split_chunks;
/// assert_eq!(split_chunks("AABBCCDDEE", 4), vec!["AABB", "CCDD", "EE"]);
/// ```
pub fn split_chunks(value: &str, chunk_size: usize) -> Vec<&str> {
    if chunk_size == 0 || value.is_empty() {
        return Vec::new();
    }

    // Byte slicing is safe once the caller has validated an ASCII alphabet;
    // fall back to char boundaries otherwise.
    if value.is_ascii() {
        return value
            .as_bytes()
            .chunks(chunk_size)
            .filter_map(|c| std::str::from_utf8(c).ok())
            .collect();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in value.char_indices() {
        if count == chunk_size {
            chunks.push(&value[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&value[start..]);
    chunks
}

/// Parse an unsigned hex string into a `u64`.
pub fn parse_hex_u64(value: &str) -> Result<u64, FormatError> {
    if !is_hex(value) {
        return Err(FormatError::InvalidHex(value.to_string()));
    }
    u64::from_str_radix(value, 16).map_err(|_| FormatError::Overflow {
        value: value.to_string(),
        bits: 64,
    })
}

/// Parse an unsigned hex string into a `u32`.
pub fn parse_hex_u32(value: &str) -> Result<u32, FormatError> {
    narrow(value, parse_hex_u64(value)?, 32)
}

/// Parse an unsigned hex string into a `u16`.
pub fn parse_hex_u16(value: &str) -> Result<u16, FormatError> {
    narrow(value, parse_hex_u64(value)?, 16)
}

/// Parse an unsigned hex string into a `u8`.
pub fn parse_hex_u8(value: &str) -> Result<u8, FormatError> {
    narrow(value, parse_hex_u64(value)?, 8)
}

fn narrow<T: TryFrom<u64>>(value: &str, parsed: u64, bits: u32) -> Result<T, FormatError> {
    T::try_from(parsed).map_err(|_| FormatError::Overflow {
        value: value.to_string(),
        bits,
    })
}

/// Parse a purely decimal string into a `u64`.
pub fn parse_decimal_u64(value: &str) -> Result<u64, FormatError> {
    if !is_decimal(value) {
        return Err(FormatError::InvalidDecimal(value.to_string()));
    }
    value.parse::<u64>().map_err(|_| FormatError::Overflow {
        value: value.to_string(),
        bits: 64,
    })
}

/// XOR two hex operands and render the result as 8 upper-case hex digits.
///
/// # Examples
/// ```
/// use genvolt_core::codec::xor_hex;
/// assert_eq!(xor_hex("7ac5b2e0", "7AC5B2E1").unwrap(), "00000001");
/// ```
pub fn xor_hex(a: &str, b: &str) -> Result<String, FormatError> {
    let left = parse_hex_u32(a)?;
    let right = parse_hex_u32(b)?;
    Ok(format!("{:08X}", left ^ right))
}

/// Render a hex value as binary digits, left-padded to `width` bits.
///
/// Values that need more than `width` bits are rejected instead of being
/// rendered wider than the caller's layout expects.
///
/// # Examples
/// ```
/// use genvolt_core::codec::hex_to_binary;
/// assert_eq!(hex_to_binary("83", 8).unwrap(), "10000011");
/// assert!(hex_to_binary("1FF", 8).is_err());
/// ```
pub fn hex_to_binary(value: &str, width: usize) -> Result<String, FormatError> {
    let parsed = parse_hex_u64(value)?;
    let needed = u64::BITS - parsed.leading_zeros();
    if needed as usize > width {
        return Err(FormatError::WidthTooNarrow {
            value: parsed,
            needed,
            width,
        });
    }
    Ok(format!("{:0width$b}", parsed, width = width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_chunks() {
        assert_eq!(
            split_chunks("7AC5B2E17AC5B2E1", CHUNK_SIZE),
            vec!["7AC5B2E1", "7AC5B2E1"]
        );
        assert_eq!(split_chunks("ABCDEFGHIJ", 8), vec!["ABCDEFGH", "IJ"]);
        assert!(split_chunks("", 8).is_empty());
        assert!(split_chunks("ABC", 0).is_empty());
    }

    #[test]
    fn test_split_chunks_non_ascii() {
        assert_eq!(split_chunks("ééé", 2), vec!["éé", "é"]);
    }

    #[test]
    fn test_xor_hex() {
        assert_eq!(xor_hex("7ECFB7E4", "7AC5B2E1").unwrap(), "040A0505");
        assert_eq!(xor_hex("7ac4d1e1", "7AC5B2E1").unwrap(), "00016300");
        // Short operands are zero-extended
        assert_eq!(xor_hex("1", "F").unwrap(), "0000000E");
    }

    #[test]
    fn test_xor_hex_invalid() {
        assert!(matches!(
            xor_hex("7AC5B2EZ", "7AC5B2E1"),
            Err(FormatError::InvalidHex(_))
        ));
        assert!(matches!(xor_hex("", "7AC5B2E1"), Err(FormatError::InvalidHex(_))));
        assert!(matches!(xor_hex("+1", "00"), Err(FormatError::InvalidHex(_))));
        assert!(matches!(
            xor_hex("123456789", "00"),
            Err(FormatError::Overflow { bits: 32, .. })
        ));
    }

    #[test]
    fn test_hex_to_binary() {
        assert_eq!(hex_to_binary("8001", 16).unwrap(), "1000000000000001");
        assert_eq!(hex_to_binary("00", 8).unwrap(), "00000000");
        assert_eq!(hex_to_binary("ff", 8).unwrap(), "11111111");
    }

    #[test]
    fn test_hex_to_binary_width_enforced() {
        let err = hex_to_binary("100", 8).unwrap_err();
        assert_eq!(
            err,
            FormatError::WidthTooNarrow {
                value: 0x100,
                needed: 9,
                width: 8
            }
        );
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal_u64("0001234").unwrap(), 1234);
        assert!(matches!(
            parse_decimal_u64("12a4"),
            Err(FormatError::InvalidDecimal(_))
        ));
        assert!(matches!(
            parse_decimal_u64("18446744073709551616"),
            Err(FormatError::Overflow { bits: 64, .. })
        ));
    }

    #[test]
    fn test_parse_hex_narrowing() {
        assert_eq!(parse_hex_u8("FF").unwrap(), 255);
        assert!(parse_hex_u8("100").is_err());
        assert_eq!(parse_hex_u16("0700").unwrap(), 1792);
    }

    proptest! {
        #[test]
        fn prop_xor_commutative(a in any::<u32>(), b in any::<u32>()) {
            let a = format!("{:08X}", a);
            let b = format!("{:08X}", b);
            prop_assert_eq!(xor_hex(&a, &b).unwrap(), xor_hex(&b, &a).unwrap());
        }

        #[test]
        fn prop_xor_self_is_zero(a in any::<u32>()) {
            let a = format!("{:08x}", a);
            prop_assert_eq!(xor_hex(&a, &a).unwrap(), "00000000");
        }

        #[test]
        fn prop_hex_to_binary_width(v in any::<u16>()) {
            let bits = hex_to_binary(&format!("{:X}", v), 16).unwrap();
            prop_assert_eq!(bits.len(), 16);
            prop_assert_eq!(u16::from_str_radix(&bits, 2).unwrap(), v);
        }

        #[test]
        fn prop_split_chunks_rejoins(s in "[0-9A-F]{0,70}") {
            let chunks = split_chunks(&s, CHUNK_SIZE);
            prop_assert_eq!(chunks.concat(), s.clone());
            prop_assert!(chunks.iter().all(|c| c.len() <= CHUNK_SIZE));
        }
    }
}
