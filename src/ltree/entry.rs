//! Single file entry tree builder
//!
//! Every entry occupies two lines:
//!
//! ```text
//! 0<TAB><number of child entries>
//! <value><TAB><value>...        (one value per field-type header tag)
//! ```
//!
//! followed directly by its child entries, depth first. The builder walks
//! these lines with an explicit stack of `(node, children left)` frames, so
//! tree depth never turns into call stack depth.

use tracing::{debug, instrument, trace};

use super::error::{LtreeError, LtreeResult};
use super::split::{trim_carriage_return, LineCursor, SplitValues, FIELD_DELIMITER, OFFSET_DELIMITER};
use super::tree::{EntryTree, NodeId};
use super::types::*;
use super::values::{decimal_to_u64, hex_to_u64, normalize_hex_digest};

struct Frame {
    node: NodeId,
    remaining: usize,
}

/// Builds an [`EntryTree`] from the entry lines following the field-type header
pub(crate) struct EntryTreeBuilder<'c, 'a> {
    cursor: &'c mut LineCursor<'a>,
    types: &'c SplitValues<'a>,
    max_depth: usize,
    verbose: bool,
}

impl<'c, 'a> EntryTreeBuilder<'c, 'a> {
    pub fn new(cursor: &'c mut LineCursor<'a>, types: &'c SplitValues<'a>, options: &ParseOptions) -> Self {
        Self {
            cursor,
            types,
            max_depth: options.max_depth,
            verbose: options.verbose && crate::logging::is_trace_enabled(),
        }
    }

    /// Parse the root entry at the cursor and all of its descendants
    #[instrument(skip_all)]
    pub fn build(mut self) -> LtreeResult<EntryTree> {
        let (root_entry, child_count) = self.parse_entry()?;
        let mut tree = EntryTree::new(root_entry);
        let root = tree.root();
        let remaining = self.check_child_count(child_count)?;
        tree.reserve_children(root, self.child_reservation(remaining))?;

        let mut stack = vec![Frame { node: root, remaining }];

        while let Some(frame) = stack.last_mut() {
            if frame.remaining == 0 {
                stack.pop();
                continue;
            }
            frame.remaining -= 1;
            let parent = frame.node;

            let depth = stack.len();
            if depth > self.max_depth {
                return Err(LtreeError::DepthExceeded { max_depth: self.max_depth });
            }

            let (entry, child_count) = self.parse_entry()?;
            let node = tree.append_child(parent, entry);
            let remaining = self.check_child_count(child_count)?;
            tree.reserve_children(node, self.child_reservation(remaining))?;

            stack.push(Frame { node, remaining });
        }

        debug!(
            entries = tree.len(),
            end_line = self.cursor.position(),
            "Parsed single file entries"
        );
        Ok(tree)
    }

    /// Declared children must fit in the lines that are left
    fn check_child_count(&self, child_count: u64) -> LtreeResult<usize> {
        let position = self.cursor.position() as u64;
        let available = self.cursor.number_of_lines() as u64;
        match position.checked_add(child_count) {
            Some(end) if end <= available => Ok(child_count as usize),
            _ => Err(LtreeError::OutOfBounds(format!(
                "{} child entries at line {} exceed the {} available lines",
                child_count, position, available
            ))),
        }
    }

    /// Children that can still fit in the remaining lines; a larger declared
    /// count fails while parsing, before its storage would be used
    fn child_reservation(&self, child_count: usize) -> usize {
        child_count.min(self.cursor.remaining() / LINES_PER_ENTRY)
    }

    /// Parse one entry (count line and value line), leaving the cursor after both
    fn parse_entry(&mut self) -> LtreeResult<(SingleFileEntry, u64)> {
        self.cursor.require(LINES_PER_ENTRY)?;

        let count_line = self.cursor.position();
        let count_fields = SplitValues::split(self.cursor.current()?, FIELD_DELIMITER);
        if count_fields.len() != 2 || count_fields.get(0) != Some(ENTRY_LINE_MARKER) {
            return Err(LtreeError::malformed_entry(
                count_line,
                "unsupported single file entry first line",
            ));
        }
        let child_count = decimal_to_u64(trim_carriage_return(count_fields.get(1).unwrap_or_default()))?;
        self.cursor.advance();

        let values = SplitValues::split(self.cursor.current()?, FIELD_DELIMITER);
        if values.len() != self.types.len() {
            return Err(LtreeError::malformed_entry(
                count_line + 1,
                format!("{} values for {} field types", values.len(), self.types.len()),
            ));
        }

        let mut entry = SingleFileEntry::default();

        for (type_string, value_string) in self.types.iter().zip(values.iter()) {
            let type_string = trim_carriage_return(type_string);
            let value_string = trim_carriage_return(value_string);

            if self.verbose {
                trace!(
                    tag = %String::from_utf8_lossy(type_string),
                    value = %String::from_utf8_lossy(value_string),
                    "entry value"
                );
            }

            // Empty values are absent values
            if value_string.is_empty() {
                continue;
            }
            set_entry_value(&mut entry, type_string, value_string)?;
        }
        self.cursor.advance();

        trace!(name = ?entry.name_lossy(), child_count, "Parsed single file entry");
        Ok((entry, child_count))
    }
}

/// Store one non-empty value according to its field type
fn set_entry_value(entry: &mut SingleFileEntry, type_string: &[u8], value: &[u8]) -> LtreeResult<()> {
    match type_string {
        TAG_ACCESS_TIME => entry.access_time = decimal_to_u64(value)?,
        TAG_CREATION_TIME => entry.creation_time = decimal_to_u64(value)?,
        TAG_ENTRY_MODIFICATION_TIME => entry.entry_modification_time = decimal_to_u64(value)?,
        TAG_MODIFICATION_TIME => entry.modification_time = decimal_to_u64(value)?,
        // Only the low 32 bits are kept
        TAG_FLAGS => entry.flags = decimal_to_u64(value)? as u32,
        TAG_SIZE => entry.size = decimal_to_u64(value)?,
        TAG_MD5_HASH => entry.md5_hash = Some(normalize_hex_digest(value)?),
        TAG_NAME => entry.name = Some(value.to_vec()),
        TAG_DATA_RANGE => {
            // <unknown> <offset> <size>, both hexadecimal
            let parts = SplitValues::split(value, OFFSET_DELIMITER);
            if let (3, Some(offset), Some(size)) = (parts.len(), parts.get(1), parts.get(2)) {
                entry.data_offset = hex_to_u64(offset)? as i64;
                entry.data_size = hex_to_u64(size)?;
            }
        }
        tag if INERT_ENTRY_TAGS.iter().any(|inert| *inert == tag) => {}
        tag => trace!(tag = %String::from_utf8_lossy(tag), "Ignoring unknown entry field type"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ltree::error::ErrorKind;
    use crate::ltree::split::LINE_DELIMITER;

    fn build(header: &str, body: &str, options: &ParseOptions) -> (LtreeResult<EntryTree>, usize) {
        let lines = SplitValues::split(body.as_bytes(), LINE_DELIMITER);
        let mut cursor = LineCursor::new(lines);
        let types = SplitValues::split(header.as_bytes(), FIELD_DELIMITER);
        let result = EntryTreeBuilder::new(&mut cursor, &types, options).build();
        (result, cursor.position())
    }

    fn build_ok(header: &str, body: &str) -> EntryTree {
        build(header, body, &ParseOptions::default()).0.unwrap()
    }

    #[test]
    fn test_single_root() {
        let (tree, position) = build("n\tls", "0\t0\nroot\t12\n\n", &ParseOptions::default());
        let tree = tree.unwrap();
        assert_eq!(tree.len(), 1);
        let root = tree.root_file_entry();
        assert_eq!(root.name(), Some("root"));
        assert_eq!(root.entry().size, 12);
        assert_eq!(position, 2);
    }

    #[test]
    fn test_nested_declared_order() {
        let body = "0\t2\nroot\n0\t1\ndir\n0\t0\nfile1\n0\t0\nfile2\n\n";
        let tree = build_ok("n", body);
        let names: Vec<String> = tree
            .iter()
            .map(|(_, e)| e.name_lossy().unwrap_or_default().into_owned())
            .collect();
        assert_eq!(names, vec!["root", "dir", "file1", "file2"]);

        let root = tree.root_file_entry();
        assert_eq!(root.number_of_sub_file_entries(), 2);
        let dir = root.sub_file_entry(0).unwrap();
        assert_eq!(dir.sub_file_entry(0).unwrap().name(), Some("file1"));
        assert_eq!(root.sub_file_entry(1).unwrap().name(), Some("file2"));
    }

    #[test]
    fn test_all_attributes() {
        let header = "n\topr\tac\tcr\twr\tmo\tls\tha\tbe\tp\tcid\tzz\r";
        let body = "0\t0\n\
                    a.txt\t4294967297\t1\t2\t3\t4\t99\tD41D8cd9\t0 1a 2b\t\t7\tignored\r\n";
        let tree = build_ok(header, body);
        let entry = tree.root_file_entry().entry().clone();
        assert_eq!(entry.name_str(), Some("a.txt"));
        assert_eq!(entry.flags, 1);
        assert_eq!(entry.access_time, 1);
        assert_eq!(entry.creation_time, 2);
        assert_eq!(entry.modification_time, 3);
        assert_eq!(entry.entry_modification_time, 4);
        assert_eq!(entry.size, 99);
        assert_eq!(entry.md5_hash.as_deref(), Some("d41d8cd9"));
        assert_eq!(entry.data_offset, 0x1a);
        assert_eq!(entry.data_size, 0x2b);
    }

    #[test]
    fn test_data_range_needs_three_parts() {
        let tree = build_ok("be", "0\t0\n1a 2b\n");
        let entry = tree.root_file_entry().entry();
        assert_eq!(entry.data_offset, 0);
        assert_eq!(entry.data_size, 0);
    }

    #[test]
    fn test_data_range_bad_hex() {
        let (result, _) = build("be", "0\t0\n0 zz 2b\n", &ParseOptions::default());
        assert!(matches!(result, Err(LtreeError::MalformedNumber { radix: 16, .. })));
    }

    #[test]
    fn test_empty_values_skipped() {
        let tree = build_ok("n\tls\tha", "0\t0\n\t\t\n");
        assert_eq!(tree.root_file_entry().entry(), &SingleFileEntry::default());
    }

    #[test]
    fn test_empty_value_keeps_earlier_value() {
        let tree = build_ok("ls\tls\tn\tn", "0\t0\n5\t\tfirst\t\n");
        let entry = tree.root_file_entry().entry();
        assert_eq!(entry.size, 5);
        assert_eq!(entry.name_str(), Some("first"));
    }

    #[test]
    fn test_child_reservation_limited_by_lines() {
        // 9 lines; after the root entry 7 remain, room for at most 3 children
        let body = "0\t6\nroot\n0\t0\na\n0\t0\nb\n0\t0\nc\n";
        let lines = SplitValues::split(body.as_bytes(), LINE_DELIMITER);
        let mut cursor = LineCursor::new(lines);
        let types = SplitValues::split(b"n", FIELD_DELIMITER);
        let mut builder = EntryTreeBuilder::new(&mut cursor, &types, &ParseOptions::default());

        let (_, child_count) = builder.parse_entry().unwrap();
        let declared = builder.check_child_count(child_count).unwrap();
        assert_eq!(declared, 6);
        assert_eq!(builder.child_reservation(declared), 3);
        assert_eq!(builder.child_reservation(1), 1);
    }

    #[test]
    fn test_name_kept_verbatim() {
        let tree = build_ok("n", "0\t0\nr\u{e9}sum\u{e9} 0x10.doc\r\n");
        assert_eq!(tree.root_file_entry().name(), Some("r\u{e9}sum\u{e9} 0x10.doc"));
    }

    #[test]
    fn test_name_bytes_not_decoded() {
        let lines = SplitValues::split(b"0\t0\nr\xe9sum\xe9.doc\n\n", LINE_DELIMITER);
        let mut cursor = LineCursor::new(lines);
        let types = SplitValues::split(b"n", FIELD_DELIMITER);
        let tree = EntryTreeBuilder::new(&mut cursor, &types, &ParseOptions::default())
            .build()
            .unwrap();
        let root = tree.root_file_entry();
        assert_eq!(root.name_bytes(), Some(&b"r\xe9sum\xe9.doc"[..]));
        assert!(root.name().is_none());
    }

    #[test]
    fn test_value_count_mismatch() {
        let (result, _) = build("n\tls", "0\t0\nonly-name\n", &ParseOptions::default());
        match result {
            Err(LtreeError::MalformedEntry { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_bad_count_line() {
        for body in ["1\t0\nroot\n", "0\nroot\n", "0\t0\t0\nroot\n", "00\t0\nroot\n"] {
            let (result, _) = build("n", body, &ParseOptions::default());
            assert_eq!(result.unwrap_err().kind(), ErrorKind::MalformedStream, "{:?}", body);
        }
        let (result, _) = build("n", "0\tx\nroot\n", &ParseOptions::default());
        assert!(matches!(result, Err(LtreeError::MalformedNumber { .. })));
    }

    #[test]
    fn test_child_count_exceeds_lines() {
        let (result, _) = build("n", "0\t5\nroot\n0\t0\nchild\n", &ParseOptions::default());
        assert!(matches!(result, Err(LtreeError::OutOfBounds(_))));

        let (result, _) = build("n", "0\t18446744073709551615\nroot\n", &ParseOptions::default());
        assert!(matches!(result, Err(LtreeError::OutOfBounds(_))));
    }

    #[test]
    fn test_truncated_child() {
        // Two children declared, enough lines for the count check but not for the second entry
        let (result, _) = build("n", "0\t2\nroot\n0\t0\nchild\n0\t0", &ParseOptions::default());
        assert_eq!(result.unwrap_err().kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn test_bad_digest() {
        let (result, _) = build("ha", "0\t0\nAB1g\n", &ParseOptions::default());
        assert!(matches!(result, Err(LtreeError::UnsupportedCharacter { byte: b'g', .. })));
    }

    fn chain(depth: usize) -> String {
        let mut body = String::new();
        for level in 0..depth {
            body.push_str(&format!("0\t1\nlevel{}\n", level));
        }
        body.push_str("0\t0\nleaf\n\n");
        body
    }

    #[test]
    fn test_deep_chain_is_iterative() {
        let options = ParseOptions::default().with_max_depth(usize::MAX);
        let tree = build("n", &chain(20_000), &options).0.unwrap();
        assert_eq!(tree.len(), 20_001);
        let mut path: Vec<String> = (1..20_000).map(|l| format!("level{}", l)).collect();
        path.push("leaf".to_string());
        let leaf = tree.find_by_path(&path.join("/")).unwrap();
        assert_eq!(tree.depth(leaf), 20_000);
    }

    #[test]
    fn test_max_depth() {
        let options = ParseOptions::default().with_max_depth(3);
        let (result, _) = build("n", &chain(3), &options);
        assert_eq!(result.unwrap().len(), 4);

        let (result, _) = build("n", &chain(4), &options);
        assert!(matches!(result, Err(LtreeError::DepthExceeded { max_depth: 3 })));
    }
}
