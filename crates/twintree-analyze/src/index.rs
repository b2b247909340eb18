//! Depth-indexed candidate buckets.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use twintree_core::{FastFingerprint, Forest, Node, NodeId};

use crate::fingerprint::FastEntry;

/// Where an indexed node lives.
#[derive(Debug, Clone, Copy)]
struct Slot {
    depth: u32,
    fingerprint: FastFingerprint,
}

/// Mapping depth → fast fingerprint → bucket of node ids.
///
/// Buckets hold identifiers only; the [`Forest`] owns the nodes. Buckets and
/// their members both keep insertion order.
#[derive(Debug, Default)]
pub struct DepthIndex {
    levels: Vec<IndexMap<FastFingerprint, Vec<NodeId>>>,
    slots: HashMap<NodeId, Slot>,
    removed: HashSet<NodeId>,
}

impl DepthIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `node` to the bucket keyed by its depth and fast fingerprint.
    ///
    /// Nodes without content (zero-byte files, directories with no non-empty
    /// file below them) are skipped, as are nodes already indexed or removed.
    /// Returns whether the node was added.
    pub fn insert(&mut self, node: &Node, entry: FastEntry) -> bool {
        if !entry.has_content || self.slots.contains_key(&node.id) || self.removed.contains(&node.id)
        {
            return false;
        }

        let depth = node.depth as usize;
        if self.levels.len() <= depth {
            self.levels.resize_with(depth + 1, IndexMap::new);
        }
        self.levels[depth]
            .entry(entry.fingerprint)
            .or_default()
            .push(node.id);
        self.slots.insert(
            node.id,
            Slot {
                depth: node.depth,
                fingerprint: entry.fingerprint,
            },
        );
        true
    }

    /// Remove `id` and, first, every descendant of it.
    ///
    /// Removing a node that is not indexed is a no-op. Returns how many nodes
    /// were taken out of buckets.
    pub fn remove(&mut self, forest: &Forest, id: NodeId) -> usize {
        let mut count = 0;
        for &child in forest.children(id) {
            count += self.remove(forest, child);
        }

        self.removed.insert(id);
        let Some(slot) = self.slots.remove(&id) else {
            return count;
        };

        let level = &mut self.levels[slot.depth as usize];
        if let Some(bucket) = level.get_mut(&slot.fingerprint) {
            if let Some(pos) = bucket.iter().position(|&member| member == id) {
                bucket.remove(pos);
            }
            if bucket.is_empty() {
                level.shift_remove(&slot.fingerprint);
            }
        }
        count + 1
    }

    /// Highest depth with a slot, if anything was ever indexed.
    pub fn max_depth(&self) -> Option<u32> {
        self.levels.len().checked_sub(1).map(|d| d as u32)
    }

    /// Bucket for a (depth, fingerprint) pair.
    pub fn bucket(&self, depth: u32, fingerprint: FastFingerprint) -> Option<&[NodeId]> {
        self.levels
            .get(depth as usize)
            .and_then(|level| level.get(&fingerprint))
            .map(Vec::as_slice)
    }

    /// Keys of buckets at `depth` holding at least two nodes, in insertion order.
    pub fn candidate_keys(&self, depth: u32) -> Vec<FastFingerprint> {
        self.levels
            .get(depth as usize)
            .map(|level| {
                level
                    .iter()
                    .filter(|(_, bucket)| bucket.len() >= 2)
                    .map(|(fp, _)| *fp)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether `id` is currently in a bucket.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check whether no node is indexed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FastTable;
    use twintree_core::GroupId;

    const G: GroupId = GroupId(1);

    fn index_all(forest: &Forest) -> DepthIndex {
        let mut table = FastTable::new();
        let mut index = DepthIndex::new();
        for node in forest.iter() {
            let entry = table.compute(forest, node.id);
            index.insert(node, entry);
        }
        index
    }

    /// Two identical `d/{x,y}` trees under one root.
    fn twin_forest() -> (Forest, [NodeId; 7]) {
        let mut forest = Forest::new();
        let x1 = forest.push_file("x", "/r/a/x", 3, G);
        let y1 = forest.push_file("y", "/r/a/y", 4, G);
        let a = forest.push_directory("a", "/r/a", vec![x1, y1], None, G);
        let x2 = forest.push_file("x", "/r/b/x", 3, G);
        let y2 = forest.push_file("y", "/r/b/y", 4, G);
        let b = forest.push_directory("b", "/r/b", vec![x2, y2], None, G);
        let r = forest.push_directory("r", "/r", vec![a, b], None, G);
        (forest, [x1, y1, a, x2, y2, b, r])
    }

    #[test]
    fn test_insert_groups_by_depth_and_fingerprint() {
        let (forest, [x1, y1, a, x2, y2, b, r]) = twin_forest();
        let index = index_all(&forest);
        let mut table = FastTable::new();

        assert_eq!(index.len(), 7);
        assert_eq!(index.max_depth(), Some(2));

        let fx = table.compute(&forest, x1).fingerprint;
        assert_eq!(index.bucket(0, fx), Some(&[x1, x2][..]));
        let fa = table.compute(&forest, a).fingerprint;
        assert_eq!(index.bucket(1, fa), Some(&[a, b][..]));
        let fr = table.compute(&forest, r).fingerprint;
        assert_eq!(index.bucket(2, fr), Some(&[r][..]));

        assert_eq!(index.candidate_keys(0).len(), 2);
        assert_eq!(index.candidate_keys(1), vec![fa]);
        assert!(index.candidate_keys(2).is_empty());
        assert!(index.contains(y1) && index.contains(y2));
    }

    #[test]
    fn test_empty_nodes_are_not_indexed() {
        let mut forest = Forest::new();
        let e1 = forest.push_file("e", "/r/e1", 0, G);
        let e2 = forest.push_file("e", "/r/e2", 0, G);
        let d1 = forest.push_directory("d1", "/r/d1", Vec::new(), None, G);
        let d2 = forest.push_directory("d2", "/r/d2", Vec::new(), None, G);
        let z = forest.push_file("z", "/r/z/z", 0, G);
        let only_empty = forest.push_directory("z", "/r/z", vec![z], None, G);

        let index = index_all(&forest);
        for id in [e1, e2, d1, d2, z, only_empty] {
            assert!(!index.contains(id));
        }
        assert!(index.is_empty());
        assert_eq!(index.max_depth(), None);
    }

    #[test]
    fn test_remove_cascades_to_descendants() {
        let (forest, [x1, y1, a, x2, y2, b, _]) = twin_forest();
        let mut index = index_all(&forest);
        let mut table = FastTable::new();
        let fx = table.compute(&forest, x1).fingerprint;
        let fa = table.compute(&forest, a).fingerprint;

        assert_eq!(index.remove(&forest, a), 3);

        assert!(!index.contains(a));
        assert!(!index.contains(x1));
        assert!(!index.contains(y1));
        assert_eq!(index.bucket(0, fx), Some(&[x2][..]));
        assert_eq!(index.bucket(1, fa), Some(&[b][..]));
        assert!(index.contains(y2));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (forest, [x1, _, a, x2, _, _, _]) = twin_forest();
        let mut index = index_all(&forest);
        let before = index.len();

        assert_eq!(index.remove(&forest, a), 3);
        assert_eq!(index.remove(&forest, a), 0);
        assert_eq!(index.remove(&forest, x1), 0);
        assert_eq!(index.len(), before - 3);
        assert!(index.contains(x2));
    }

    #[test]
    fn test_empty_bucket_is_dropped() {
        let (forest, [x1, _, _, x2, _, _, _]) = twin_forest();
        let mut index = index_all(&forest);
        let mut table = FastTable::new();
        let fx = table.compute(&forest, x1).fingerprint;

        index.remove(&forest, x1);
        index.remove(&forest, x2);
        assert_eq!(index.bucket(0, fx), None);
    }

    #[test]
    fn test_removed_node_is_never_reinserted() {
        let (forest, [x1, ..]) = twin_forest();
        let mut index = index_all(&forest);
        let mut table = FastTable::new();
        let entry = table.compute(&forest, x1);

        index.remove(&forest, x1);
        assert!(!index.insert(forest.node(x1), entry));
        assert!(!index.contains(x1));
    }
}
