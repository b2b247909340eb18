//! Core types for twintree.
//!
//! This crate provides the data structures shared by the tree builder and
//! the duplicate analyzer: the node arena, fingerprint values, errors and
//! configuration.

mod config;
mod error;
mod node;
mod tree;

pub use config::{AnalyzeConfig, AnalyzeConfigBuilder, DEFAULT_MMAP_THRESHOLD, RootMode};
pub use error::{HashError, ScanError, ScanWarning, WarningKind};
pub use node::{FastFingerprint, GroupId, Node, NodeId, NodeKind, StrongFingerprint};
pub use tree::{Forest, RootEntry, ScanStats};
