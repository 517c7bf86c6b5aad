//! Arena-backed single file entry tree
//!
//! Nodes are stored in one `Vec` and refer to each other by [`NodeId`].
//! Each node owns the ordered list of its children's ids; dropping the tree
//! releases every node at once, however deep the tree is.

use serde::Serialize;

use super::error::LtreeResult;
use super::types::SingleFileEntry;

/// Index of a node in an [`EntryTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct EntryNode {
    entry: SingleFileEntry,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tree of single file entries; node 0 is the root
#[derive(Debug, Clone)]
pub struct EntryTree {
    nodes: Vec<EntryNode>,
}

/// Flattened view of one entry, for listings
#[derive(Debug, Clone, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub data_offset: i64,
    pub data_size: u64,
    pub md5_hash: Option<String>,
    pub flags: u32,
    pub number_of_children: usize,
}

impl EntryTree {
    /// Create a tree holding only the root entry
    pub fn new(root: SingleFileEntry) -> Self {
        Self {
            nodes: vec![EntryNode {
                entry: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entry(&self, id: NodeId) -> Option<&SingleFileEntry> {
        self.nodes.get(id.0).map(|node| &node.entry)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Reserve room for `additional` children of `parent`
    pub(crate) fn reserve_children(&mut self, parent: NodeId, additional: usize) -> LtreeResult<()> {
        self.nodes.try_reserve(additional)?;
        self.nodes[parent.0].children.try_reserve_exact(additional)?;
        Ok(())
    }

    /// Append `entry` as the last child of `parent`
    pub(crate) fn append_child(&mut self, parent: NodeId, entry: SingleFileEntry) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(EntryNode {
            entry,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Handle on the root entry
    pub fn root_file_entry(&self) -> FileEntry<'_> {
        FileEntry { tree: self, id: self.root() }
    }

    pub fn file_entry(&self, id: NodeId) -> Option<FileEntry<'_>> {
        (id.0 < self.nodes.len()).then_some(FileEntry { tree: self, id })
    }

    /// Pre-order traversal in declared order, starting at the root
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root()],
        }
    }

    /// Depth of a node; the root is at depth 0
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    /// Look up an entry by name path below the root (`\` or `/` separated)
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for component in path.split(|c: char| c == '\\' || c == '/').filter(|c| !c.is_empty()) {
            current = self
                .children(current)
                .iter()
                .copied()
                .find(|&child| {
                    self.nodes[child.0].entry.name.as_deref() == Some(component.as_bytes())
                })?;
        }
        Some(current)
    }

    /// Flatten every entry below the root into path-keyed rows
    pub fn listing(&self) -> Vec<TreeEntry> {
        let mut out = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: Vec<(NodeId, String)> = self
            .children(self.root())
            .iter()
            .rev()
            .map(|&id| (id, String::new()))
            .collect();

        while let Some((id, parent_path)) = stack.pop() {
            let node = &self.nodes[id.0];
            let name = node.entry.name_lossy().unwrap_or_default().into_owned();
            let path = join_path(&parent_path, &name);
            for &child in node.children.iter().rev() {
                stack.push((child, path.clone()));
            }
            out.push(TreeEntry {
                path,
                name,
                size: node.entry.size,
                data_offset: node.entry.data_offset,
                data_size: node.entry.data_size,
                md5_hash: node.entry.md5_hash.clone(),
                flags: node.entry.flags,
                number_of_children: node.children.len(),
            });
        }
        out
    }

    /// Listing rendered as pretty JSON
    pub fn listing_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.listing())
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Pre-order iterator over `(NodeId, &SingleFileEntry)`
pub struct PreOrder<'a> {
    tree: &'a EntryTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (NodeId, &'a SingleFileEntry);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.nodes.get(id.0)?;
        self.stack.extend(node.children.iter().rev().copied());
        Some((id, &node.entry))
    }
}

// =============================================================================
// File Entry Handle
// =============================================================================

/// Read-only handle on one entry of a tree
#[derive(Clone, Copy)]
pub struct FileEntry<'a> {
    tree: &'a EntryTree,
    id: NodeId,
}

impl<'a> FileEntry<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn entry(&self) -> &'a SingleFileEntry {
        &self.tree.nodes[self.id.0].entry
    }

    /// Name as text; `None` when absent or not valid UTF-8
    pub fn name(&self) -> Option<&'a str> {
        self.entry().name_str()
    }

    pub fn name_bytes(&self) -> Option<&'a [u8]> {
        self.entry().name.as_deref()
    }

    pub fn parent(&self) -> Option<FileEntry<'a>> {
        self.tree
            .parent(self.id)
            .map(|id| FileEntry { tree: self.tree, id })
    }

    pub fn number_of_sub_file_entries(&self) -> usize {
        self.tree.children(self.id).len()
    }

    pub fn sub_file_entry(&self, index: usize) -> Option<FileEntry<'a>> {
        self.tree
            .children(self.id)
            .get(index)
            .map(|&id| FileEntry { tree: self.tree, id })
    }

    pub fn sub_file_entry_by_name(&self, name: &str) -> Option<FileEntry<'a>> {
        self.sub_file_entries().find(|entry| entry.name_bytes() == Some(name.as_bytes()))
    }

    pub fn sub_file_entries(&self) -> impl Iterator<Item = FileEntry<'a>> + 'a {
        let tree = self.tree;
        tree.children(self.id)
            .iter()
            .map(move |&id| FileEntry { tree, id })
    }
}

impl std::fmt::Debug for FileEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileEntry")
            .field("id", &self.id)
            .field("entry", self.entry())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> SingleFileEntry {
        SingleFileEntry {
            name: Some(name.as_bytes().to_vec()),
            ..Default::default()
        }
    }

    /// root -> [docs -> [a.txt, b.txt], c.bin]
    fn sample_tree() -> EntryTree {
        let mut tree = EntryTree::new(SingleFileEntry::default());
        let root = tree.root();
        let docs = tree.append_child(root, named("docs"));
        tree.append_child(docs, named("a.txt"));
        tree.append_child(docs, named("b.txt"));
        tree.append_child(root, named("c.bin"));
        tree
    }

    #[test]
    fn test_preorder_declared_order() {
        let tree = sample_tree();
        let names: Vec<Option<&str>> = tree.iter().map(|(_, e)| e.name_str()).collect();
        assert_eq!(
            names,
            vec![None, Some("docs"), Some("a.txt"), Some("b.txt"), Some("c.bin")]
        );
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_file_entry_navigation() {
        let tree = sample_tree();
        let root = tree.root_file_entry();
        assert_eq!(root.number_of_sub_file_entries(), 2);
        assert!(root.parent().is_none());

        let docs = root.sub_file_entry_by_name("docs").unwrap();
        assert_eq!(docs.number_of_sub_file_entries(), 2);
        let b = docs.sub_file_entry(1).unwrap();
        assert_eq!(b.name(), Some("b.txt"));
        assert_eq!(b.parent().unwrap().name(), Some("docs"));
        assert!(docs.sub_file_entry(2).is_none());
        assert!(root.sub_file_entry_by_name("missing").is_none());
        assert_eq!(tree.depth(b.id()), 2);
    }

    #[test]
    fn test_find_by_path() {
        let tree = sample_tree();
        let id = tree.find_by_path("docs\\a.txt").unwrap();
        assert_eq!(tree.entry(id).unwrap().name_str(), Some("a.txt"));
        assert_eq!(tree.find_by_path("/docs/b.txt"), tree.find_by_path("docs/b.txt"));
        assert_eq!(tree.find_by_path(""), Some(tree.root()));
        assert!(tree.find_by_path("docs/zzz").is_none());
    }

    #[test]
    fn test_listing() {
        let tree = sample_tree();
        let listing = tree.listing();
        let paths: Vec<&str> = listing.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["docs", "docs/a.txt", "docs/b.txt", "c.bin"]);
        assert_eq!(listing[0].number_of_children, 2);

        let json = tree.listing_json().unwrap();
        assert!(json.contains("\"path\": \"docs/a.txt\""));
    }
}
