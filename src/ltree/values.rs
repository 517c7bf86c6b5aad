//! Field value decoding: decimal and hexadecimal integers, digest strings

use super::error::{LtreeError, LtreeResult};

fn malformed(value: &[u8], radix: u32) -> LtreeError {
    LtreeError::MalformedNumber {
        field: String::from_utf8_lossy(value).into_owned(),
        radix,
    }
}

fn digits_to_u64(value: &[u8], radix: u32) -> LtreeResult<u64> {
    if value.is_empty() {
        return Err(malformed(value, radix));
    }
    let mut result: u64 = 0;
    for &byte in value {
        let digit = (byte as char)
            .to_digit(radix)
            .ok_or_else(|| malformed(value, radix))?;
        result = result
            .checked_mul(radix as u64)
            .and_then(|v| v.checked_add(digit as u64))
            .ok_or_else(|| malformed(value, radix))?;
    }
    Ok(result)
}

/// Decode an unsigned decimal field (digits only)
pub fn decimal_to_u64(value: &[u8]) -> LtreeResult<u64> {
    digits_to_u64(value, 10)
}

/// Decode an unsigned hexadecimal field (no `0x` prefix)
pub fn hex_to_u64(value: &[u8]) -> LtreeResult<u64> {
    digits_to_u64(value, 16)
}

/// Lowercase a hex digest, rejecting anything outside `[0-9A-Fa-f]`.
///
/// Output length always equals input length.
pub fn normalize_hex_digest(value: &[u8]) -> LtreeResult<String> {
    let mut digest = String::with_capacity(value.len());
    for (position, &byte) in value.iter().enumerate() {
        match byte {
            b'0'..=b'9' | b'a'..=b'f' => digest.push(byte as char),
            b'A'..=b'F' => digest.push(byte.to_ascii_lowercase() as char),
            _ => return Err(LtreeError::UnsupportedCharacter { byte, position }),
        }
    }
    Ok(digest)
}
