//! Parser for the single files (ltree) section of EWF logical evidence images

pub mod common;
pub mod logging;
pub mod ltree;

pub use ltree::{
    EntryTree, ErrorKind, FileEntry, LtreeError, LtreeResult, ParseOptions, SingleFileEntry,
    SingleFiles,
};
