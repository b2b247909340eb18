//! Duplicate detection for twintree.
//!
//! Finds duplicate files and duplicate whole directory subtrees across one or
//! more roots. With a single root every duplicate set is reported; with
//! several roots only sets that span at least two of them are.
//!
//! # Algorithm
//!
//! 1. Build each root into a shared forest. Every node gets a cheap
//!    xxh3 fingerprint (file size, or child names and fingerprints for
//!    directories) and lands in a bucket keyed by (depth, fingerprint).
//!    Zero-byte files and directories without content are never indexed.
//! 2. From the deepest level up, split every bucket of two or more nodes by
//!    BLAKE3 content fingerprint. Each confirmed set is reported, then its
//!    members and all of their descendants are dropped from the index, so a
//!    duplicate directory hides the duplicates inside it.
//!
//! ```rust,no_run
//! use twintree_analyze::{AnalyzeConfig, DuplicateAnalyzer};
//!
//! let config = AnalyzeConfig::new(["/backup/2023", "/backup/2024"]);
//! let report = DuplicateAnalyzer::run(config).unwrap();
//!
//! for group in &report.groups {
//!     for line in group.display_lines() {
//!         println!("{line}");
//!     }
//!     println!();
//! }
//! ```

mod duplicates;
mod fingerprint;
mod index;

pub use duplicates::{
    DuplicateAnalyzer, DuplicateGroup, DuplicateReport, EntryKind, display_path,
};
pub use fingerprint::{DIRECTORY_SIZE_MARKER, FastEntry, FastTable, StrongCache};
pub use index::DepthIndex;

// Re-export core types
pub use twintree_core::{
    AnalyzeConfig, AnalyzeConfigBuilder, FastFingerprint, Forest, GroupId, HashError, Node,
    NodeId, RootMode, ScanError, StrongFingerprint,
};
