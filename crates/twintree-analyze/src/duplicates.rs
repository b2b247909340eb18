//! Duplicate file and subtree detection.
//!
//! Runs in two phases:
//! 1. Every root is built into one [`Forest`]; each node gets a fast
//!    fingerprint and is placed in the [`DepthIndex`] as it is created.
//! 2. Buckets are visited from the deepest level up. Each candidate bucket is
//!    split by strong fingerprint, confirmed sets are reported, and reported
//!    nodes are removed together with their whole subtree so that nothing
//!    inside a duplicate directory is reported again.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use twintree_core::{
    AnalyzeConfig, Forest, GroupId, HashError, NodeId, RootMode, ScanError, StrongFingerprint,
};
use twintree_scan::TreeBuilder;

use crate::fingerprint::{FastTable, StrongCache};
use crate::index::DepthIndex;

/// Kind of the entries in a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Leaf entries.
    File,
    /// Whole directory subtrees.
    Directory,
}

/// A set of entries with identical content, reported together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Depth shared by every member.
    pub depth: u32,

    /// Whether the members are files or directories.
    pub kind: EntryKind,

    /// Strong fingerprint shared by every member.
    pub fingerprint: StrongFingerprint,

    /// Size of one member in bytes (all leaves below it for directories).
    pub size: u64,

    /// Display paths in discovery order.
    pub paths: Vec<PathBuf>,

    /// Wasted space: size * (count - 1).
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Get the number of duplicates.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// Check if keeping one copy, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Paths as printed, directories with a trailing separator.
    pub fn display_lines(&self) -> Vec<String> {
        self.paths
            .iter()
            .map(|path| display_path(path, self.kind))
            .collect()
    }
}

/// Results from a duplicate analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Whether sets had to span several roots.
    pub mode: RootMode,

    /// Groups in reporting order: deepest first, then bucket order.
    pub groups: Vec<DuplicateGroup>,

    /// Number of nodes placed in the index.
    pub nodes_indexed: usize,

    /// Number of files whose content was hashed.
    pub files_hashed: u64,

    /// Number of candidates skipped because they could not be hashed.
    pub skipped_unreadable: u64,

    /// Causes of skipped candidates, collected when unreadable warnings are on.
    pub unreadable: Vec<HashError>,

    /// Number of duplicate groups.
    pub group_count: usize,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Get total number of reported paths across all groups.
    pub fn total_duplicate_paths(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len()).sum()
    }
}

/// Owns the forest, fingerprint tables and depth index of one run.
pub struct DuplicateAnalyzer {
    config: AnalyzeConfig,
    builder: TreeBuilder,
    forest: Forest,
    fast: FastTable,
    index: DepthIndex,
}

impl DuplicateAnalyzer {
    /// Create an analyzer with no roots yet.
    pub fn new(config: AnalyzeConfig) -> Self {
        Self {
            config,
            builder: TreeBuilder::new(),
            forest: Forest::new(),
            fast: FastTable::new(),
            index: DepthIndex::new(),
        }
    }

    /// Create an analyzer and build every configured root, in order.
    ///
    /// Rejects an invalid config, then stops at the first root that cannot
    /// be stat'ed or listed.
    pub fn from_config(config: AnalyzeConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let roots = config.roots.clone();
        let mut analyzer = Self::new(config);
        for root in &roots {
            analyzer.add_root(root)?;
        }
        Ok(analyzer)
    }

    /// Build, analyze and report in one call.
    pub fn run(config: AnalyzeConfig) -> Result<DuplicateReport, ScanError> {
        Ok(Self::from_config(config)?.analyze())
    }

    /// Build one more root. Its group is its 1-based position among roots.
    pub fn add_root(&mut self, path: &Path) -> Result<NodeId, ScanError> {
        let group = GroupId::new(self.forest.roots().len() as u32 + 1);
        let fast = &mut self.fast;
        let index = &mut self.index;

        let id = self.builder.build(path, group, &mut self.forest, |forest, id| {
            let entry = fast.compute(forest, id);
            index.insert(forest.node(id), entry);
        })?;

        debug!(path = %path.display(), group = %group, indexed = self.index.len(), "Added root");
        Ok(id)
    }

    /// The forest built so far.
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// The depth index in its current state.
    pub fn index(&self) -> &DepthIndex {
        &self.index
    }

    /// Mode implied by the number of roots built.
    pub fn mode(&self) -> RootMode {
        RootMode::for_root_count(self.forest.roots().len())
    }

    /// Walk the index from the deepest level up and report duplicate sets.
    pub fn analyze(mut self) -> DuplicateReport {
        let mode = self.mode();
        let nodes_indexed = self.index.len();
        let mut strong = StrongCache::new(self.config.mmap_threshold);
        let mut groups = Vec::new();
        let mut skipped_unreadable = 0;
        let mut unreadable: IndexSet<HashError> = IndexSet::new();

        let max_depth = self.index.max_depth();
        for depth in max_depth.into_iter().flat_map(|max| (0..=max).rev()) {
            for key in self.index.candidate_keys(depth) {
                let Some(members) = self.index.bucket(depth, key).map(<[NodeId]>::to_vec) else {
                    continue;
                };
                if members.len() < 2 {
                    continue;
                }
                if mode.requires_cross_group() && !self.spans_groups(&members) {
                    debug!(depth, members = members.len(), "Bucket within a single root");
                    continue;
                }

                let mut partitions: IndexMap<StrongFingerprint, Vec<NodeId>> = IndexMap::new();
                for id in members {
                    match strong.compute(&self.forest, id) {
                        Ok(fingerprint) => partitions.entry(fingerprint).or_default().push(id),
                        Err(err) => {
                            skipped_unreadable += 1;
                            let path = &self.forest.node(id).path;
                            if self.config.warn_unreadable {
                                warn!(path = %path.display(), "Skipping unreadable candidate: {err}");
                                unreadable.insert(err);
                            } else {
                                debug!(path = %path.display(), "Skipping unreadable candidate: {err}");
                            }
                        }
                    }
                }

                for (fingerprint, ids) in partitions {
                    if ids.len() < 2 {
                        continue;
                    }
                    if mode.requires_cross_group() && !self.spans_groups(&ids) {
                        debug!(depth, %fingerprint, "Confirmed set within a single root");
                        continue;
                    }

                    let group = self.make_group(mode, depth, fingerprint, &ids);
                    for &id in &ids {
                        self.index.remove(&self.forest, id);
                    }
                    groups.push(group);
                }
            }
        }

        let group_count = groups.len();
        let total_wasted_space = groups.iter().map(|g| g.wasted_bytes).sum();
        info!(
            groups = group_count,
            files_hashed = strong.files_hashed(),
            bytes_hashed = strong.bytes_hashed(),
            skipped_unreadable,
            "Analysis complete"
        );

        DuplicateReport {
            mode,
            groups,
            nodes_indexed,
            files_hashed: strong.files_hashed(),
            skipped_unreadable,
            unreadable: unreadable.into_iter().collect(),
            group_count,
            total_wasted_space,
        }
    }

    /// Check whether the nodes come from at least two roots.
    fn spans_groups(&self, ids: &[NodeId]) -> bool {
        !ids.iter().map(|&id| self.forest.node(id).group).all_equal()
    }

    fn make_group(
        &self,
        mode: RootMode,
        depth: u32,
        fingerprint: StrongFingerprint,
        ids: &[NodeId],
    ) -> DuplicateGroup {
        let first = self.forest.node(ids[0]);
        let kind = if first.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let size = self.forest.subtree_size(first.id);
        let paths = ids.iter().map(|&id| self.display_path(mode, id)).collect();

        DuplicateGroup {
            depth,
            kind,
            fingerprint,
            size,
            paths,
            wasted_bytes: size * (ids.len() as u64 - 1),
        }
    }

    /// Path relative to its root in single-root mode, as built otherwise.
    fn display_path(&self, mode: RootMode, id: NodeId) -> PathBuf {
        let node = self.forest.node(id);
        if mode == RootMode::Multi {
            return node.path.clone();
        }
        self.forest
            .root_of(node.group)
            .and_then(|root| node.path.strip_prefix(&root.path).ok())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| node.path.clone())
    }
}

/// Render a reported path, directories with a trailing separator.
pub fn display_path(path: &Path, kind: EntryKind) -> String {
    let mut line = path.display().to_string();
    if kind == EntryKind::Directory && !line.ends_with(std::path::MAIN_SEPARATOR) {
        line.push(std::path::MAIN_SEPARATOR);
    }
    line
}
