//! UTF-16 little-endian decoding for EWF text sections

use crate::ltree::{LtreeError, LtreeResult};

const BYTE_ORDER_MARK: u16 = 0xfeff;

/// Decode a UTF-16LE stream into a `String`.
///
/// A leading byte order mark is dropped and decoding stops at the first NUL
/// code unit. Odd-sized streams and unpaired surrogates are rejected.
pub fn utf16le_to_string(data: &[u8]) -> LtreeResult<String> {
    if data.len() % 2 != 0 {
        return Err(LtreeError::Conversion(format!(
            "UTF-16 stream has odd size {}",
            data.len()
        )));
    }

    let mut units = data
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .take_while(|&unit| unit != 0)
        .peekable();

    if units.peek() == Some(&BYTE_ORDER_MARK) {
        units.next();
    }

    char::decode_utf16(units)
        .enumerate()
        .map(|(index, decoded)| {
            decoded.map_err(|e| {
                LtreeError::Conversion(format!(
                    "unpaired surrogate 0x{:04x} near character {}",
                    e.unpaired_surrogate(),
                    index
                ))
            })
        })
        .collect()
}
