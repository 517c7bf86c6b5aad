//! EWF single files (ltree) section parser
//!
//! Logical evidence images (L01/Lx01) carry an `ltree` section describing
//! the captured files and folders. The section is UTF-16LE text made of
//! newline separated, tab delimited lines:
//!
//! ```text
//! 5                               format marker, starts with a digit
//! rec
//! cl<TAB>tb                       record type tags
//! <TAB>1024                       record values ("tb" = media size)
//!
//! entry
//!
//! p<TAB>n<TAB>ls<TAB>ha<TAB>be... field-type header
//! 0<TAB>1                         root entry: number of child entries
//! 1<TAB><TAB>0<TAB><TAB>          root entry values
//! 0<TAB>0                         first child...
//! <TAB>a.txt<TAB>3<TAB>...
//!                                 empty terminator line
//! ```
//!
//! Entries are laid out depth first: each entry's children follow its value
//! line directly. [`SingleFiles`] owns the raw section, transcodes it and
//! produces an [`EntryTree`] of [`SingleFileEntry`] values.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ewf_ltree::ltree::{SingleFiles, ParseOptions};
//!
//! let mut single_files = SingleFiles::with_options(ParseOptions::default());
//! let media_size = single_files.parse_stream(ltree_section_bytes)?;
//!
//! if let Some(entry) = single_files.file_entry_by_path("Documents\\report.doc") {
//!     println!("{:?} at offset {}", entry.name(), entry.entry().data_offset);
//! }
//! ```

mod entry;
mod error;
mod record;
mod single_files;
mod split;
mod tree;
mod types;
pub mod values;

pub use error::{ErrorKind, LtreeError, LtreeResult};
pub use single_files::SingleFiles;
pub use split::SplitValues;
pub use tree::{EntryTree, FileEntry, NodeId, PreOrder, TreeEntry};
pub use types::{ParseOptions, SingleFileEntry, DEFAULT_MAX_DEPTH};
