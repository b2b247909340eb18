//! Tree builder for twintree.
//!
//! Walks a root directory with jwalk (serially, in listing order) and
//! materializes every entry as a node in a shared [`Forest`]. A callback is
//! invoked for each node once its children exist, which is where the
//! analyzer fingerprints and indexes it.
//!
//! # Example
//!
//! ```rust,no_run
//! use twintree_scan::{Forest, GroupId, TreeBuilder};
//!
//! let mut forest = Forest::new();
//! let root = TreeBuilder::new()
//!     .build("/path/to/scan".as_ref(), GroupId::new(1), &mut forest, |forest, id| {
//!         println!("{}", forest.node(id).path.display());
//!     })
//!     .unwrap();
//!
//! println!("Depth of root: {}", forest.node(root).depth);
//! ```

mod path;
mod scanner;

pub use path::clean_path;
pub use scanner::TreeBuilder;

// Re-export core types for convenience
pub use twintree_core::{
    Forest, GroupId, Node, NodeId, NodeKind, ScanError, ScanStats, ScanWarning, WarningKind,
};
