//! JWalk-based tree builder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use twintree_core::{Forest, GroupId, NodeId, ScanError, ScanStats, ScanWarning, WarningKind};

use crate::path::clean_path;

/// Materializes a root into a [`Forest`].
///
/// The walk is serial and unsorted: children keep the order the directory
/// listing returned them in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeBuilder;

impl TreeBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self
    }

    /// Build the tree for `root` tagged with `group`.
    ///
    /// `on_node` is called exactly once per node, after all of its children
    /// (post-order). Failing to stat or list the root itself is an error;
    /// failures below it are recorded on the affected directory.
    pub fn build<F>(
        &self,
        root: &Path,
        group: GroupId,
        forest: &mut Forest,
        mut on_node: F,
    ) -> Result<NodeId, ScanError>
    where
        F: FnMut(&Forest, NodeId),
    {
        let root_path = clean_path(root);
        let metadata = std::fs::metadata(&root_path).map_err(|e| ScanError::io(&root_path, e))?;
        let mut stats = ScanStats::new();

        if !metadata.is_dir() {
            let id = forest.push_file(node_name(&root_path), root_path.clone(), metadata.len(), group);
            stats.record_file(metadata.len());
            on_node(forest, id);
            forest.add_root(root_path, group, id, stats);
            return Ok(id);
        }

        // The walker reports listing failures as entries; a root that cannot
        // be listed must abort instead.
        std::fs::read_dir(&root_path).map_err(|e| ScanError::io(&root_path, e))?;

        let mut listing = self.collect_entries(&root_path);
        let id = build_node(&root_path, group, &mut listing, forest, &mut stats, &mut on_node);

        for (path, warning) in listing.warnings.drain() {
            debug!(path = %path.display(), message = %warning.message, "Unattached scan warning");
        }
        debug!(
            root = %root_path.display(),
            group = %group,
            files = stats.total_files,
            dirs = stats.total_dirs,
            bytes = stats.total_size,
            "Built tree"
        );

        forest.add_root(root_path, group, id, stats);
        Ok(id)
    }

    /// Collect all entries below `root_path`, grouped by parent directory.
    ///
    /// Any failure leaves a warning on the directory whose listing it made
    /// incomplete.
    fn collect_entries(&self, root_path: &Path) -> Listing {
        let walker = WalkDir::new(root_path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(false)
            .min_depth(1);

        let mut listing = Listing::default();
        // Directory currently open at each depth; the walk is depth-first.
        let mut open_dirs: Vec<PathBuf> = vec![root_path.to_path_buf()];

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let depth = err.depth();
                    let parent = depth
                        .checked_sub(1)
                        .and_then(|d| open_dirs.get(d))
                        .cloned()
                        .unwrap_or_else(|| root_path.to_path_buf());
                    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| parent.clone());
                    let warning = warning_from_walk_error(&path, &err);
                    listing.record_warning(parent, warning);
                    continue;
                }
            };

            let path = entry.path();
            let Some(parent) = path.parent().map(Path::to_path_buf) else {
                continue;
            };
            let name: CompactString = entry.file_name().to_string_lossy().as_ref().into();

            if entry.file_type().is_dir() {
                open_dirs.truncate(entry.depth);
                open_dirs.push(path.clone());

                if let Some(err) = &entry.read_children_error {
                    let warning = warning_from_walk_error(&path, err);
                    listing.record_warning(path.clone(), warning);
                }
                listing.children.entry(parent).or_default().push(EntryInfo {
                    name,
                    path,
                    size: None,
                });
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    listing.children.entry(parent).or_default().push(EntryInfo {
                        name,
                        path,
                        size: Some(metadata.len()),
                    });
                }
                Err(err) => {
                    let warning = ScanWarning::new(&path, err.to_string(), WarningKind::MetadataError);
                    listing.record_warning(parent, warning);
                }
            }
        }

        listing
    }
}

fn warning_from_walk_error(path: &Path, err: &jwalk::Error) -> ScanWarning {
    match err.io_error() {
        Some(io) => ScanWarning::read_error(path, io),
        None => ScanWarning::new(path, err.to_string(), WarningKind::ReadError),
    }
}

/// Walker output awaiting assembly into nodes.
#[derive(Default)]
struct Listing {
    children: HashMap<PathBuf, Vec<EntryInfo>>,
    /// Keyed by the directory whose listing is incomplete.
    warnings: HashMap<PathBuf, ScanWarning>,
}

impl Listing {
    /// Keep the first warning per directory.
    fn record_warning(&mut self, dir: PathBuf, warning: ScanWarning) {
        warn!(dir = %dir.display(), path = %warning.path.display(), "{}", warning.message);
        self.warnings.entry(dir).or_insert(warning);
    }
}

/// Temporary struct for collecting entry information.
struct EntryInfo {
    name: CompactString,
    path: PathBuf,
    /// `None` for directories.
    size: Option<u64>,
}

/// Recursively build a directory node and its children, post-order.
fn build_node<F>(
    path: &Path,
    group: GroupId,
    listing: &mut Listing,
    forest: &mut Forest,
    stats: &mut ScanStats,
    on_node: &mut F,
) -> NodeId
where
    F: FnMut(&Forest, NodeId),
{
    let entries = listing.children.remove(path).unwrap_or_default();
    let mut children = Vec::with_capacity(entries.len());

    for entry in entries {
        let child = match entry.size {
            None => build_node(&entry.path, group, listing, forest, stats, on_node),
            Some(size) => {
                stats.record_file(size);
                let id = forest.push_file(entry.name, entry.path, size, group);
                on_node(forest, id);
                id
            }
        };
        children.push(child);
    }

    let warning = listing.warnings.remove(path);
    stats.record_dir(warning.is_some());

    let id = forest.push_directory(node_name(path), path.to_path_buf(), children, warning, group);
    on_node(forest, id);
    id
}

fn node_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| n.to_string_lossy().as_ref().into())
        .unwrap_or_else(|| path.to_string_lossy().as_ref().into())
}
