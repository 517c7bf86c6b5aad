//! Single files container: owns the raw ltree section and the parsed entry tree

use std::io::Read;

use tracing::{debug, instrument, warn};

use crate::common::utf16le_to_string;

use super::entry::EntryTreeBuilder;
use super::error::{LtreeError, LtreeResult};
use super::record::parse_record_values;
use super::split::{trim_carriage_return, LineCursor, SplitValues, FIELD_DELIMITER, LINE_DELIMITER};
use super::tree::{EntryTree, FileEntry};
use super::types::*;

/// Result of parsing the ltree text, committed to the container on success
struct ParsedLtree {
    media_size: Option<u64>,
    tree: Option<EntryTree>,
}

/// Single files (ltree) section of a logical evidence image
#[derive(Debug, Default)]
pub struct SingleFiles {
    /// Raw UTF-16LE section data
    ltree_data: Option<Vec<u8>>,
    media_size: Option<u64>,
    tree: Option<EntryTree>,
    parsed: bool,
    options: ParseOptions,
}

impl SingleFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Store the raw ltree section data
    pub fn set_ltree_data(&mut self, data: Vec<u8>) -> LtreeResult<()> {
        if self.parsed {
            return Err(LtreeError::AlreadyParsed);
        }
        self.ltree_data = Some(data);
        Ok(())
    }

    /// Read the raw ltree section data from `reader` until end of input
    pub fn read_ltree_data<R: Read>(&mut self, mut reader: R) -> LtreeResult<usize> {
        let mut data = Vec::new();
        let size = reader.read_to_end(&mut data)?;
        self.set_ltree_data(data)?;
        Ok(size)
    }

    pub fn ltree_data(&self) -> Option<&[u8]> {
        self.ltree_data.as_deref()
    }

    /// Store `data` and parse it
    pub fn parse_stream(&mut self, data: Vec<u8>) -> LtreeResult<Option<u64>> {
        self.set_ltree_data(data)?;
        self.parse()
    }

    /// Parse the stored ltree data, returning the media size if the record
    /// section carries one.
    ///
    /// Nothing is stored on failure; the container can still be cleared
    /// or dropped.
    pub fn parse(&mut self) -> LtreeResult<Option<u64>> {
        if self.parsed {
            return Err(LtreeError::AlreadyParsed);
        }
        let data = match self.ltree_data.as_deref() {
            Some(data) if !data.is_empty() => data,
            _ => {
                return Err(LtreeError::MissingData(
                    "invalid single files - missing ltree data".to_string(),
                ))
            }
        };

        let options = &self.options;
        let parsed = with_dispatch(options, || {
            let text = utf16le_to_string(data)?;
            parse_ltree_text(text.as_bytes(), options)
        })?;
        Ok(self.commit(parsed))
    }

    /// Parse already transcoded (UTF-8) ltree text
    pub fn parse_file_entries(&mut self, text: &[u8]) -> LtreeResult<Option<u64>> {
        if self.parsed {
            return Err(LtreeError::AlreadyParsed);
        }
        let options = &self.options;
        let parsed = with_dispatch(options, || parse_ltree_text(text, options))?;
        Ok(self.commit(parsed))
    }

    fn commit(&mut self, parsed: ParsedLtree) -> Option<u64> {
        debug!(
            media_size = ?parsed.media_size,
            entries = parsed.tree.as_ref().map_or(0, EntryTree::len),
            "Single files parsed"
        );
        self.media_size = parsed.media_size;
        self.tree = parsed.tree;
        self.parsed = true;
        self.media_size
    }

    /// Release the raw data and the entry tree
    pub fn clear(&mut self) {
        self.ltree_data = None;
        self.media_size = None;
        self.tree = None;
        self.parsed = false;
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Total media size from the record section
    pub fn media_size(&self) -> Option<u64> {
        self.media_size
    }

    pub fn tree(&self) -> Option<&EntryTree> {
        self.tree.as_ref()
    }

    pub fn root_file_entry(&self) -> Option<FileEntry<'_>> {
        self.tree.as_ref().map(EntryTree::root_file_entry)
    }

    /// Look up an entry by its name path below the root
    pub fn file_entry_by_path(&self, path: &str) -> Option<FileEntry<'_>> {
        let tree = self.tree.as_ref()?;
        tree.find_by_path(path).and_then(|id| tree.file_entry(id))
    }
}

fn with_dispatch<T>(options: &ParseOptions, f: impl FnOnce() -> T) -> T {
    match &options.dispatch {
        Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
        None => f(),
    }
}

/// Parse the record section and the entry tree from ltree text
#[instrument(skip_all, fields(size = text.len()))]
fn parse_ltree_text(text: &[u8], options: &ParseOptions) -> LtreeResult<ParsedLtree> {
    let lines = SplitValues::parse(text, text.len(), LINE_DELIMITER)?;
    let mut cursor = LineCursor::new(lines);

    // The first line holds a numeric format marker
    if !matches!(cursor.line(0).and_then(|line| line.first()), Some(b'0'..=b'9')) {
        return Err(LtreeError::MalformedStream(
            "unsupported single file entries string".to_string(),
        ));
    }

    let media_size = match cursor.find_marker(RECORD_MARKER) {
        Some(index) => {
            cursor.seek(index + 1);
            parse_record_values(&mut cursor, options.verbose)?.media_size
        }
        None => {
            debug!("No record section in single file entries");
            None
        }
    };

    let header_index = cursor
        .find_marker(ENTRY_MARKER)
        .map(|index| index + ENTRY_HEADER_DISTANCE)
        .filter(|&index| index < cursor.number_of_lines());

    let tree = match header_index {
        Some(index) => {
            cursor.seek(index);
            let types = SplitValues::split(cursor.current()?, FIELD_DELIMITER);
            cursor.advance();
            let tree = EntryTreeBuilder::new(&mut cursor, &types, options).build()?;
            check_terminator(&cursor, options)?;
            Some(tree)
        }
        None => {
            debug!("No entry section in single file entries");
            None
        }
    };

    Ok(ParsedLtree { media_size, tree })
}

/// The entry tree should be followed by an empty line
fn check_terminator(cursor: &LineCursor<'_>, options: &ParseOptions) -> LtreeResult<()> {
    let position = cursor.position();
    let problem = match cursor.line(position) {
        None => "missing empty line after single file entries",
        Some(line) if !trim_carriage_return(line).is_empty() => {
            "non-empty line after single file entries"
        }
        Some(_) => return Ok(()),
    };
    if options.strict_terminator {
        return Err(LtreeError::MalformedStream(format!("{} (line {})", problem, position)));
    }
    warn!(line = position, "{}", problem);
    Ok(())
}
