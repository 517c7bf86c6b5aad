//! Delimiter based splitting of the ltree text into lines and fields

use super::error::{LtreeError, LtreeResult};

pub(crate) const LINE_DELIMITER: u8 = b'\n';
pub(crate) const FIELD_DELIMITER: u8 = b'\t';
pub(crate) const OFFSET_DELIMITER: u8 = b' ';

/// Ordered slices of a buffer separated by a single delimiter byte.
///
/// Slices never include the delimiter. Empty segments are kept, so
/// `"a\n\nb\n"` yields `["a", "", "b", ""]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitValues<'a> {
    values: Vec<&'a [u8]>,
}

impl<'a> SplitValues<'a> {
    /// Split the first `length` bytes of `data` on `delimiter`
    pub fn parse(data: &'a [u8], length: usize, delimiter: u8) -> LtreeResult<Self> {
        if length > data.len() {
            return Err(LtreeError::InvalidArgument(format!(
                "split length {} exceeds buffer size {}",
                length,
                data.len()
            )));
        }
        let values = data[..length].split(|&b| b == delimiter).collect();
        Ok(Self { values })
    }

    /// Split a whole slice (the usual case for a line or a field)
    pub fn split(data: &'a [u8], delimiter: u8) -> Self {
        Self {
            values: data.split(|&b| b == delimiter).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        self.values.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.values.iter().copied()
    }
}

/// Drop a single trailing carriage return
pub(crate) fn trim_carriage_return(value: &[u8]) -> &[u8] {
    match value.split_last() {
        Some((b'\r', rest)) => rest,
        _ => value,
    }
}

/// Cursor over the lines of the ltree text.
///
/// The position only moves forward; every consumer leaves it just after
/// the last line it used.
#[derive(Debug)]
pub(crate) struct LineCursor<'a> {
    lines: SplitValues<'a>,
    position: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(lines: SplitValues<'a>) -> Self {
        Self { lines, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn number_of_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn remaining(&self) -> usize {
        self.lines.len() - self.position
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.lines.len());
    }

    pub fn line(&self, index: usize) -> Option<&'a [u8]> {
        self.lines.get(index)
    }

    /// Line at the cursor, failing when the cursor sits at the end
    pub fn current(&self) -> LtreeResult<&'a [u8]> {
        self.lines.get(self.position).ok_or_else(|| {
            LtreeError::OutOfBounds(format!(
                "line iterator {} out of bounds ({} lines)",
                self.position,
                self.lines.len()
            ))
        })
    }

    pub fn advance(&mut self) {
        if self.position < self.lines.len() {
            self.position += 1;
        }
    }

    /// Ensure at least `count` lines are available from the cursor
    pub fn require(&self, count: usize) -> LtreeResult<()> {
        if self.position >= self.lines.len() {
            return Err(LtreeError::OutOfBounds(format!(
                "line iterator {} out of bounds ({} lines)",
                self.position,
                self.lines.len()
            )));
        }
        if self.remaining() < count {
            return Err(LtreeError::OutOfBounds(format!(
                "lines too small: need {} from line {}, have {}",
                count,
                self.position,
                self.lines.len()
            )));
        }
        Ok(())
    }

    /// Index of the first line equal to `marker` once a trailing CR is removed
    pub fn find_marker(&self, marker: &[u8]) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| trim_carriage_return(line) == marker)
    }
}
