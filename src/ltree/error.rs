//! Error types for ltree parsing

use std::fmt;
use std::io;

/// Result type alias for ltree operations
pub type LtreeResult<T> = Result<T, LtreeError>;

/// Broad error categories reported by the single files parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    MissingData,
    ConversionFailure,
    MalformedStream,
    OutOfBounds,
    UnsupportedCharacter,
    AllocationFailure,
}

/// Errors that can occur while parsing an ltree section
#[derive(Debug)]
pub enum LtreeError {
    /// Invalid input passed to an entry point
    InvalidArgument(String),
    /// Required raw stream is absent
    MissingData(String),
    /// UTF-16 transcoding or text view failed
    Conversion(String),
    /// A field could not be decoded as a decimal or hexadecimal number
    MalformedNumber { field: String, radix: u32 },
    /// Structural violation outside the record and entry blocks
    MalformedStream(String),
    /// Record type and value lines do not correspond
    MalformedRecord(String),
    /// Entry line violates the entry layout (line index is 0-based)
    MalformedEntry { line: usize, reason: String },
    /// Cursor or declared child count exceeds the available lines
    OutOfBounds(String),
    /// Digest contained a byte outside [0-9A-Fa-f]
    UnsupportedCharacter { byte: u8, position: usize },
    /// Tree nesting exceeded the configured maximum depth
    DepthExceeded { max_depth: usize },
    /// Storage for child entries could not be reserved
    AllocationFailure(String),
    /// The container already holds a parsed tree
    AlreadyParsed,
    /// I/O error while reading raw section data
    Io(io::Error),
}

impl LtreeError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LtreeError::InvalidArgument(_) | LtreeError::AlreadyParsed => ErrorKind::InvalidArgument,
            LtreeError::MissingData(_) | LtreeError::Io(_) => ErrorKind::MissingData,
            LtreeError::Conversion(_) | LtreeError::MalformedNumber { .. } => ErrorKind::ConversionFailure,
            LtreeError::MalformedStream(_)
            | LtreeError::MalformedRecord(_)
            | LtreeError::MalformedEntry { .. } => ErrorKind::MalformedStream,
            LtreeError::OutOfBounds(_) | LtreeError::DepthExceeded { .. } => ErrorKind::OutOfBounds,
            LtreeError::UnsupportedCharacter { .. } => ErrorKind::UnsupportedCharacter,
            LtreeError::AllocationFailure(_) => ErrorKind::AllocationFailure,
        }
    }

    pub(crate) fn malformed_entry(line: usize, reason: impl Into<String>) -> Self {
        LtreeError::MalformedEntry { line, reason: reason.into() }
    }
}

impl fmt::Display for LtreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LtreeError::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
            LtreeError::MissingData(e) => write!(f, "Missing data: {}", e),
            LtreeError::Conversion(e) => write!(f, "Conversion error: {}", e),
            LtreeError::MalformedNumber { field, radix } => {
                let kind = if *radix == 16 { "hexadecimal" } else { "decimal" };
                write!(f, "Malformed {} number: {:?}", kind, field)
            }
            LtreeError::MalformedStream(e) => write!(f, "Malformed stream: {}", e),
            LtreeError::MalformedRecord(e) => write!(f, "Malformed record: {}", e),
            LtreeError::MalformedEntry { line, reason } => {
                write!(f, "Malformed entry at line {}: {}", line, reason)
            }
            LtreeError::OutOfBounds(e) => write!(f, "Out of bounds: {}", e),
            LtreeError::UnsupportedCharacter { byte, position } => {
                write!(f, "Unsupported character 0x{:02x} at position {}", byte, position)
            }
            LtreeError::DepthExceeded { max_depth } => {
                write!(f, "Entry tree exceeds maximum depth of {}", max_depth)
            }
            LtreeError::AllocationFailure(e) => write!(f, "Allocation failure: {}", e),
            LtreeError::AlreadyParsed => write!(f, "Single files already parsed"),
            LtreeError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for LtreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LtreeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LtreeError {
    fn from(err: io::Error) -> Self {
        LtreeError::Io(err)
    }
}

impl From<std::str::Utf8Error> for LtreeError {
    fn from(err: std::str::Utf8Error) -> Self {
        LtreeError::Conversion(err.to_string())
    }
}

impl From<std::collections::TryReserveError> for LtreeError {
    fn from(err: std::collections::TryReserveError) -> Self {
        LtreeError::AllocationFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(LtreeError::malformed_entry(3, "x").kind(), ErrorKind::MalformedStream);
        assert_eq!(LtreeError::MalformedRecord("x".into()).kind(), ErrorKind::MalformedStream);
        assert_eq!(
            LtreeError::MalformedNumber { field: "z".into(), radix: 10 }.kind(),
            ErrorKind::ConversionFailure
        );
        assert_eq!(LtreeError::DepthExceeded { max_depth: 4 }.kind(), ErrorKind::OutOfBounds);
        assert_eq!(LtreeError::AlreadyParsed.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_display() {
        let err = LtreeError::UnsupportedCharacter { byte: b'g', position: 3 };
        assert_eq!(err.to_string(), "Unsupported character 0x67 at position 3");

        let err = LtreeError::MalformedNumber { field: "1x".into(), radix: 16 };
        assert_eq!(err.to_string(), "Malformed hexadecimal number: \"1x\"");
    }

    #[test]
    fn test_io_source() {
        use std::error::Error;
        let err: LtreeError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(err.source().is_some());
        assert_eq!(err.kind(), ErrorKind::MissingData);
    }
}
