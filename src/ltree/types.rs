//! Type definitions for the single files (ltree) section

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

// =============================================================================
// Core Constants
// =============================================================================

/// Line preceding the record type/value lines
pub(crate) const RECORD_MARKER: &[u8] = b"rec";
/// Line preceding the blank separator and the entry field-type header
pub(crate) const ENTRY_MARKER: &[u8] = b"entry";
/// Lines between the entry marker and the field-type header
pub(crate) const ENTRY_HEADER_DISTANCE: usize = 2;
/// First field of every entry count line
pub(crate) const ENTRY_LINE_MARKER: &[u8] = b"0";
/// Count line plus value line
pub(crate) const LINES_PER_ENTRY: usize = 2;

pub const DEFAULT_MAX_DEPTH: usize = 1024;

// =============================================================================
// Field Type Tags
// =============================================================================

// Record section
pub(crate) const TAG_TOTAL_BYTES: &[u8] = b"tb";
pub(crate) const TAG_CL: &[u8] = b"cl";

// Entries
pub(crate) const TAG_ACCESS_TIME: &[u8] = b"ac";
pub(crate) const TAG_CREATION_TIME: &[u8] = b"cr";
pub(crate) const TAG_ENTRY_MODIFICATION_TIME: &[u8] = b"mo";
pub(crate) const TAG_MODIFICATION_TIME: &[u8] = b"wr";
pub(crate) const TAG_FLAGS: &[u8] = b"opr";
pub(crate) const TAG_SIZE: &[u8] = b"ls";
pub(crate) const TAG_MD5_HASH: &[u8] = b"ha";
pub(crate) const TAG_NAME: &[u8] = b"n";
pub(crate) const TAG_DATA_RANGE: &[u8] = b"be";

/// Tags the format defines but which carry nothing this parser keeps.
/// `p` is "0" for directories and empty for files.
pub(crate) const INERT_ENTRY_TAGS: &[&[u8]] = &[
    b"aq", b"cid", b"src", b"sub", b"dl", b"du", b"id", b"jq", b"lo", b"pm", b"po", b"p",
];

// =============================================================================
// Single File Entry
// =============================================================================

/// Attributes of one file or folder in the single files tree.
///
/// Every attribute keeps its default unless the stream carries a non-empty
/// value for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SingleFileEntry {
    /// Name bytes exactly as stored in the stream
    #[serde(serialize_with = "serialize_name")]
    pub name: Option<Vec<u8>>,
    /// Low 32 bits of the decoded "opr" value
    pub flags: u32,
    pub access_time: u64,
    pub creation_time: u64,
    pub modification_time: u64,
    pub entry_modification_time: u64,
    /// Offset of the file data in the media
    pub data_offset: i64,
    pub data_size: u64,
    /// Logical size
    pub size: u64,
    /// Lowercase hex MD5 digest
    pub md5_hash: Option<String>,
}

fn serialize_name<S: Serializer>(name: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match name {
        Some(bytes) => serializer.serialize_some(&String::from_utf8_lossy(bytes)),
        None => serializer.serialize_none(),
    }
}

fn posix_to_datetime(timestamp: u64) -> Option<DateTime<Utc>> {
    if timestamp == 0 {
        return None;
    }
    let seconds = i64::try_from(timestamp).ok()?;
    DateTime::<Utc>::from_timestamp(seconds, 0)
}

impl SingleFileEntry {
    /// Name as text, if it is valid UTF-8
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_deref().and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Name as text, with invalid sequences replaced
    pub fn name_lossy(&self) -> Option<Cow<'_, str>> {
        self.name.as_deref().map(String::from_utf8_lossy)
    }

    pub fn access_datetime(&self) -> Option<DateTime<Utc>> {
        posix_to_datetime(self.access_time)
    }

    pub fn creation_datetime(&self) -> Option<DateTime<Utc>> {
        posix_to_datetime(self.creation_time)
    }

    pub fn modification_datetime(&self) -> Option<DateTime<Utc>> {
        posix_to_datetime(self.modification_time)
    }

    pub fn entry_modification_datetime(&self) -> Option<DateTime<Utc>> {
        posix_to_datetime(self.entry_modification_time)
    }

    /// Raw digest bytes, if a digest with an even number of characters is present
    pub fn md5_hash_bytes(&self) -> Option<Vec<u8>> {
        self.md5_hash.as_deref().and_then(|digest| hex::decode(digest).ok())
    }
}

// =============================================================================
// Parse Options
// =============================================================================

/// Options controlling how an ltree section is parsed
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Deepest allowed entry nesting (root is depth 0)
    pub max_depth: usize,
    /// Reject a missing or non-empty line after the entry tree
    pub strict_terminator: bool,
    /// Emit per-field trace diagnostics
    pub verbose: bool,
    /// Dispatcher the parse logs to instead of the global default
    pub dispatch: Option<tracing::Dispatch>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_terminator: false,
            verbose: false,
            dispatch: None,
        }
    }
}

impl ParseOptions {
    /// Builder: set maximum tree depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builder: require the empty terminator line
    pub fn with_strict_terminator(mut self, strict: bool) -> Self {
        self.strict_terminator = strict;
        self
    }

    /// Builder: enable per-field diagnostics
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder: log to the given dispatcher
    pub fn with_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }
}
