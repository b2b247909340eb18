//! Node arena shared by every root of a run.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;
use crate::node::{GroupId, Node, NodeId};

/// Summary statistics for one built root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total size in bytes of all leaves.
    pub total_size: u64,
    /// Total number of leaves.
    pub total_files: u64,
    /// Total number of directories, the root included.
    pub total_dirs: u64,
    /// Number of directories carrying a listing warning.
    pub warnings: u64,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a leaf.
    pub fn record_file(&mut self, size: u64) {
        self.total_files += 1;
        self.total_size += size;
    }

    /// Record a directory.
    pub fn record_dir(&mut self, warned: bool) {
        self.total_dirs += 1;
        if warned {
            self.warnings += 1;
        }
    }
}

/// A root registered in the forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootEntry {
    /// Cleaned path as given by the caller.
    pub path: PathBuf,
    /// Group tag of every node below this root.
    pub group: GroupId,
    /// Node the root path materialized as.
    pub node: NodeId,
    /// Statistics gathered while building.
    pub stats: ScanStats,
}

/// Arena owning every node of every root.
///
/// Parents own their children through the identifier lists stored in
/// [`NodeKind::Directory`](crate::NodeKind::Directory); nothing else holds
/// node references, only identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Forest {
    nodes: Vec<Node>,
    roots: Vec<RootEntry>,
}

impl Forest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> NodeId {
        NodeId::new(self.nodes.len() as u32)
    }

    /// Add a leaf.
    pub fn push_file(
        &mut self,
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        size: u64,
        group: GroupId,
    ) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Node::new_file(id, name, path, size, group));
        id
    }

    /// Add a directory whose children are already in the forest.
    ///
    /// Depth is one more than the deepest child, or 1 without children.
    pub fn push_directory(
        &mut self,
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        children: Vec<NodeId>,
        warning: Option<ScanWarning>,
        group: GroupId,
    ) -> NodeId {
        let id = self.next_id();
        let depth = children
            .iter()
            .map(|child| self.nodes[child.index()].depth + 1)
            .max()
            .unwrap_or(1);
        let mut node = Node::new_directory(id, name, path, children, warning, group);
        node.depth = depth;
        self.nodes.push(node);
        id
    }

    /// Register a built root.
    pub fn add_root(&mut self, path: PathBuf, group: GroupId, node: NodeId, stats: ScanStats) {
        self.roots.push(RootEntry {
            path,
            group,
            node,
            stats,
        });
    }

    /// Get a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this forest.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Children of a node in walker order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    /// Registered roots in the order they were added.
    pub fn roots(&self) -> &[RootEntry] {
        &self.roots
    }

    /// Find the root registered for a group.
    pub fn root_of(&self, group: GroupId) -> Option<&RootEntry> {
        self.roots.iter().find(|root| root.group == group)
    }

    /// Aggregate leaf size of the subtree rooted at `id`.
    pub fn subtree_size(&self, id: NodeId) -> u64 {
        let node = self.node(id);
        match node.size() {
            Some(size) => size,
            None => node
                .children()
                .iter()
                .map(|&child| self.subtree_size(child))
                .sum(),
        }
    }

    /// Iterate over all nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the forest has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_stats_default() {
        let stats = ScanStats::default();
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.total_files, 0);
        assert_eq!(stats.total_dirs, 0);
    }

    #[test]
    fn test_scan_stats_record() {
        let mut stats = ScanStats::new();
        stats.record_file(1024);
        stats.record_dir(false);
        stats.record_dir(true);

        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.total_size, 1024);
        assert_eq!(stats.total_dirs, 2);
        assert_eq!(stats.warnings, 1);
    }

    #[test]
    fn test_directory_depth() {
        let g = GroupId::new(1);
        let mut forest = Forest::new();

        let empty = forest.push_directory("empty", "/r/empty", Vec::new(), None, g);
        assert_eq!(forest.node(empty).depth, 1);

        let file = forest.push_file("f", "/r/a/b/f", 3, g);
        let b = forest.push_directory("b", "/r/a/b", vec![file], None, g);
        let other = forest.push_file("g", "/r/a/g", 4, g);
        let a = forest.push_directory("a", "/r/a", vec![other, b], None, g);
        let root = forest.push_directory("r", "/r", vec![a, empty], None, g);

        assert_eq!(forest.node(file).depth, 0);
        assert_eq!(forest.node(b).depth, 1);
        assert_eq!(forest.node(a).depth, 2);
        assert_eq!(forest.node(root).depth, 3);
        assert_eq!(forest.subtree_size(root), 7);
        assert_eq!(forest.len(), 6);
    }

    #[test]
    fn test_roots() {
        let mut forest = Forest::new();
        let leaf = forest.push_file("x", "/x", 1, GroupId::new(2));
        forest.add_root(PathBuf::from("/x"), GroupId::new(2), leaf, ScanStats::new());

        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.root_of(GroupId::new(2)).map(|r| r.node), Some(leaf));
        assert!(forest.root_of(GroupId::new(1)).is_none());
    }
}
