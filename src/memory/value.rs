//! Value codec
//!
//! Memory stores untyped 32-bit [`Word`]s. A word only gets a meaning where it
//! is consumed, through the conversions in this module:
//!
//! - integers: two's complement over 32 bits
//! - floats: IEEE-754 single precision bit pattern
//! - booleans: `1` / `0`, anything else is rejected
//! - characters: 7-bit ASCII ordinal
//! - pointers: like integers, but must stay below `2^24`
//!
//! Encoders are total. Decoders that can fail take the location of the node
//! consuming the word so the error can point back into the source.

use crate::interpreter::constants::MEMORY_SIZE;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::SourceLocation;

/// The universal storage unit
pub type Word = u32;

/// Word-granular memory address
pub type Address = u32;

pub const FALSE_WORD: Word = 0;
pub const TRUE_WORD: Word = 1;

/// Encode an integer already known to fit in 32 bits
pub fn int_to_word(value: i32) -> Word {
    value as Word
}

/// Encode the result of integer arithmetic, wrapping on overflow
pub fn wrap_int(value: i64) -> Word {
    value as i32 as Word
}

pub fn word_to_int(word: Word) -> i32 {
    word as i32
}

/// Encode a float; values beyond the single-precision range become infinities
pub fn float_to_word(value: f64) -> Word {
    (value as f32).to_bits()
}

pub fn word_to_float(word: Word) -> f32 {
    f32::from_bits(word)
}

pub fn bool_to_word(value: bool) -> Word {
    if value {
        TRUE_WORD
    } else {
        FALSE_WORD
    }
}

pub fn word_to_bool(word: Word, location: SourceLocation) -> Result<bool, RuntimeError> {
    match word {
        TRUE_WORD => Ok(true),
        FALSE_WORD => Ok(false),
        _ => Err(RuntimeError::InvalidBooleanEncoding { word, location }),
    }
}

pub fn char_to_word(value: u8) -> Word {
    Word::from(value)
}

pub fn word_to_char(word: Word, location: SourceLocation) -> Result<char, RuntimeError> {
    if word > 127 {
        return Err(RuntimeError::InvalidCharEncoding { word, location });
    }
    Ok(char::from(word as u8))
}

pub fn pointer_to_word(address: Address) -> Word {
    address
}

pub fn word_to_pointer(word: Word, location: SourceLocation) -> Result<Address, RuntimeError> {
    if word >= MEMORY_SIZE {
        return Err(RuntimeError::InvalidPointerEncoding { word, location });
    }
    Ok(word)
}

/// Render a float the way `PRINT(FLOAT, x)` shows it: the shortest decimal
/// that round-trips, in fixed notation when the decimal exponent lies in
/// `[-4, 16)` and in `1.5e+16` form otherwise.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "-1.2345e-5"
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if mantissa.starts_with('-') { "-" } else { "" };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    if (-4..16).contains(&exponent) {
        if exponent < 0 {
            let zeros = "0".repeat((-exponent - 1) as usize);
            format!("{}0.{}{}", sign, zeros, digits)
        } else {
            let point = exponent as usize + 1;
            if digits.len() <= point {
                let zeros = "0".repeat(point - digits.len());
                format!("{}{}{}.0", sign, digits, zeros)
            } else {
                format!("{}{}.{}", sign, &digits[..point], &digits[point..])
            }
        }
    } else {
        let (first, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{}", rest)
        };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}{}{}e{}{:02}",
            sign,
            first,
            fraction,
            exponent_sign,
            exponent.abs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn test_int_round_trip_on_edge_words() {
        for word in [0, 1, 0x7FFF_FFFF, 0x8000_0000, 0xFFFF_FFFF, 123_456_789] {
            assert_eq!(int_to_word(word_to_int(word)), word);
        }
    }

    #[test]
    fn test_overflow_wraps() {
        assert_eq!(wrap_int(1 << 31), int_to_word(i32::MIN));
        assert_eq!(wrap_int(-(1 << 31) - 1), int_to_word(i32::MAX));
        assert_eq!(wrap_int(-1), 0xFFFF_FFFF);
    }

    #[test]
    fn test_float_encoding() {
        assert_eq!(float_to_word(1.0), 0x3F80_0000);
        assert_eq!(word_to_float(float_to_word(-2.5)), -2.5);
        assert_eq!(float_to_word(1e300), 0x7F80_0000);
        assert_eq!(float_to_word(-1e300), 0xFF80_0000);
    }

    #[test]
    fn test_bool_decoding_is_strict() {
        assert_eq!(word_to_bool(1, here()), Ok(true));
        assert_eq!(word_to_bool(0, here()), Ok(false));
        assert!(matches!(
            word_to_bool(2, here()),
            Err(RuntimeError::InvalidBooleanEncoding { word: 2, .. })
        ));
    }

    #[test]
    fn test_char_range() {
        assert_eq!(word_to_char(char_to_word(b'A'), here()), Ok('A'));
        assert_eq!(word_to_char(127, here()), Ok('\u{7f}'));
        assert!(word_to_char(128, here()).is_err());
    }

    #[test]
    fn test_pointer_range() {
        assert_eq!(word_to_pointer(MEMORY_SIZE - 1, here()), Ok(MEMORY_SIZE - 1));
        assert!(matches!(
            word_to_pointer(MEMORY_SIZE, here()),
            Err(RuntimeError::InvalidPointerEncoding { .. })
        ));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(5.0), "5.0");
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(format_float(123.456), "123.456");
        assert_eq!(format_float(f64::from(0.1f32)), "0.10000000149011612");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(1.5e16), "1.5e+16");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }
}
