//! File and directory node types.

use std::fmt;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;

/// Unique identifier for a node within a [`Forest`](crate::Forest).
///
/// Identifiers are arena indices and stay valid for the lifetime of the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a u32.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Arena slot of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tag identifying which root a node descends from.
///
/// Roots are numbered from 1 in the order they were given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl GroupId {
    /// Create a new GroupId.
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cheap structural fingerprint used to form candidate buckets.
///
/// Equal values only make two nodes candidates; collisions are expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FastFingerprint(pub u128);

impl FastFingerprint {
    /// Big-endian bytes, as folded into a parent's fingerprint.
    pub fn to_be_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }
}

/// BLAKE3 content fingerprint used to confirm duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrongFingerprint(pub [u8; 32]);

impl StrongFingerprint {
    /// Create a new fingerprint from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the fingerprint as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for StrongFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Type of file system node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    /// Leaf entry. Anything that is not a directory, symlinks included.
    File {
        /// Size in bytes as reported by the walker.
        size: u64,
    },
    /// Directory.
    Directory {
        /// Children in walker order.
        children: Vec<NodeId>,
        /// Set when the directory could not be fully listed.
        warning: Option<ScanWarning>,
    },
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory { .. })
    }

    /// Check if this is a leaf.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File { .. })
    }
}

/// A single file or directory in the forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Arena identifier.
    pub id: NodeId,

    /// File/directory name (not full path).
    pub name: CompactString,

    /// Full path as discovered from the root.
    pub path: PathBuf,

    /// Node type and associated data.
    pub kind: NodeKind,

    /// 0 for files, 1 + deepest child for directories (1 when empty).
    pub depth: u32,

    /// Root this node descends from.
    pub group: GroupId,
}

impl Node {
    /// Create a new leaf node.
    pub fn new_file(
        id: NodeId,
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        size: u64,
        group: GroupId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File { size },
            depth: 0,
            group,
        }
    }

    /// Create a new directory node. Depth is derived by [`Forest`](crate::Forest).
    pub fn new_directory(
        id: NodeId,
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        children: Vec<NodeId>,
        warning: Option<ScanWarning>,
        group: GroupId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory { children, warning },
            depth: 1,
            group,
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a leaf.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Byte size for leaves, `None` for directories.
    pub fn size(&self) -> Option<u64> {
        match self.kind {
            NodeKind::File { size } => Some(size),
            NodeKind::Directory { .. } => None,
        }
    }

    /// Children in walker order; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children, .. } => children,
            NodeKind::File { .. } => &[],
        }
    }

    /// Listing warning recorded on a directory.
    pub fn warning(&self) -> Option<&ScanWarning> {
        match &self.kind {
            NodeKind::Directory { warning, .. } => warning.as_ref(),
            NodeKind::File { .. } => None,
        }
    }

    /// Name bytes as folded into fingerprints.
    ///
    /// Taken from the path so that names which are not valid UTF-8 stay distinct.
    pub fn name_bytes(&self) -> &[u8] {
        name_bytes(&self.path).unwrap_or(self.name.as_bytes())
    }
}

fn name_bytes(path: &Path) -> Option<&[u8]> {
    path.file_name().map(|name| name.as_encoded_bytes())
}
