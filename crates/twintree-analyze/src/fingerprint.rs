//! Fast and strong fingerprints.
//!
//! Both fingerprints are computed bottom-up and memoized in tables keyed by
//! [`NodeId`]; nodes themselves are never mutated. Both are order-sensitive
//! over a directory's children.

use std::collections::HashMap;
use std::fs::File;
use std::hash::Hasher as _;
use std::path::Path;

use blake3::Hasher;
use twox_hash::{xxh3::HasherExt, Xxh3Hash128};

use twintree_core::{FastFingerprint, Forest, HashError, NodeId, NodeKind, StrongFingerprint};

/// Size fed into a directory's fast fingerprint in place of a byte count.
pub const DIRECTORY_SIZE_MARKER: u64 = u64::MAX;

/// Domain-separation tag for file strong fingerprints.
const FILE_TAG: u8 = 0x01;

/// Domain-separation tag for directory strong fingerprints.
const DIRECTORY_TAG: u8 = 0x02;

/// Fast fingerprint of a node together with whether it has any content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastEntry {
    /// The fingerprint itself.
    pub fingerprint: FastFingerprint,
    /// A non-empty file, or a directory with a non-empty file below it.
    pub has_content: bool,
}

/// Memoized fast fingerprints.
#[derive(Debug, Default)]
pub struct FastTable {
    entries: HashMap<NodeId, FastEntry>,
}

impl FastTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast fingerprint of `id`, computing it (and any missing descendant) once.
    ///
    /// Files fold in only their size. Directories fold in the size marker and,
    /// per child in order, the name length, the name and the child's
    /// fingerprint.
    pub fn compute(&mut self, forest: &Forest, id: NodeId) -> FastEntry {
        if let Some(entry) = self.entries.get(&id) {
            return *entry;
        }

        let node = forest.node(id);
        let mut hasher = Xxh3Hash128::with_seed(0);

        let entry = match &node.kind {
            NodeKind::File { size } => {
                hasher.write(&size.to_be_bytes());
                FastEntry {
                    fingerprint: FastFingerprint(hasher.finish_ext()),
                    has_content: *size > 0,
                }
            }
            NodeKind::Directory { children, .. } => {
                hasher.write(&DIRECTORY_SIZE_MARKER.to_be_bytes());
                let mut has_content = false;
                for &child in children {
                    let child_entry = self.compute(forest, child);
                    let name = forest.node(child).name_bytes();
                    hasher.write(&(name.len() as u64).to_be_bytes());
                    hasher.write(name);
                    hasher.write(&child_entry.fingerprint.to_be_bytes());
                    has_content |= child_entry.has_content;
                }
                FastEntry {
                    fingerprint: FastFingerprint(hasher.finish_ext()),
                    has_content,
                }
            }
        };

        self.entries.insert(id, entry);
        entry
    }

    /// Number of memoized nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing has been computed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Memoized strong fingerprints, errors included.
#[derive(Debug)]
pub struct StrongCache {
    results: HashMap<NodeId, Result<StrongFingerprint, HashError>>,
    mmap_threshold: u64,
    files_hashed: u64,
    bytes_hashed: u64,
}

impl StrongCache {
    /// Create an empty cache. Files above `mmap_threshold` bytes are mapped.
    pub fn new(mmap_threshold: u64) -> Self {
        Self {
            results: HashMap::new(),
            mmap_threshold,
            files_hashed: 0,
            bytes_hashed: 0,
        }
    }

    /// Strong fingerprint of `id`, computed on first demand.
    ///
    /// A directory with a recorded listing warning, or with any descendant
    /// that cannot be read, fails with the first error met in child order.
    pub fn compute(&mut self, forest: &Forest, id: NodeId) -> Result<StrongFingerprint, HashError> {
        if let Some(result) = self.results.get(&id) {
            return result.clone();
        }

        let node = forest.node(id);
        let result = match &node.kind {
            NodeKind::File { size } => {
                let result = self.hash_file(&node.path, *size);
                if result.is_ok() {
                    self.files_hashed += 1;
                    self.bytes_hashed += size;
                }
                result
            }
            NodeKind::Directory {
                warning: Some(warning),
                ..
            } => Err(HashError::from(warning)),
            NodeKind::Directory { children, .. } => self.hash_directory(forest, children),
        };

        self.results.insert(id, result.clone());
        result
    }

    fn hash_directory(
        &mut self,
        forest: &Forest,
        children: &[NodeId],
    ) -> Result<StrongFingerprint, HashError> {
        let mut hasher = Hasher::new();
        hasher.update(&[DIRECTORY_TAG]);
        for &child in children {
            let child_fp = self.compute(forest, child)?;
            let name = forest.node(child).name_bytes();
            hasher.update(&(name.len() as u64).to_be_bytes());
            hasher.update(name);
            hasher.update(child_fp.as_bytes());
        }
        Ok(StrongFingerprint::new(*hasher.finalize().as_bytes()))
    }

    /// Hash the full content of a file.
    fn hash_file(&self, path: &Path, size: u64) -> Result<StrongFingerprint, HashError> {
        let mut hasher = Hasher::new();
        hasher.update(&[FILE_TAG]);

        if size > self.mmap_threshold {
            hasher
                .update_mmap(path)
                .map_err(|e| HashError::read(path, &e))?;
        } else {
            let file = File::open(path).map_err(|e| HashError::read(path, &e))?;
            hasher
                .update_reader(file)
                .map_err(|e| HashError::read(path, &e))?;
        }

        Ok(StrongFingerprint::new(*hasher.finalize().as_bytes()))
    }

    /// Number of files whose content was hashed successfully.
    pub fn files_hashed(&self) -> u64 {
        self.files_hashed
    }

    /// Bytes of file content hashed successfully.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }
}
