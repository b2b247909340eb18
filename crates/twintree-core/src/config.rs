//! Analysis configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Default size above which file content is memory-mapped for hashing.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 128 * 1024;

/// How duplicate sets are filtered with respect to roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootMode {
    /// One root: every duplicate set is reported, paths relative to the root.
    Single,
    /// Several roots: only sets spanning at least two roots are reported.
    Multi,
}

impl RootMode {
    /// Mode for a run over `count` roots.
    pub fn for_root_count(count: usize) -> Self {
        if count > 1 {
            RootMode::Multi
        } else {
            RootMode::Single
        }
    }

    /// Check whether sets must span several groups.
    pub fn requires_cross_group(self) -> bool {
        matches!(self, RootMode::Multi)
    }
}

/// Configuration for a duplicate analysis run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct AnalyzeConfig {
    /// Roots to compare, in group order.
    pub roots: Vec<PathBuf>,

    /// Log and collect candidates skipped because they could not be hashed.
    #[builder(default = "false")]
    #[serde(default)]
    pub warn_unreadable: bool,

    /// Files larger than this are memory-mapped when hashed.
    #[builder(default = "DEFAULT_MMAP_THRESHOLD")]
    #[serde(default = "default_mmap_threshold")]
    pub mmap_threshold: u64,
}

fn default_mmap_threshold() -> u64 {
    DEFAULT_MMAP_THRESHOLD
}

impl AnalyzeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.roots {
            Some(ref roots) => check_roots(roots).map_err(|e| e.to_string()),
            None => Err("Roots are required".to_string()),
        }
    }
}

fn check_roots(roots: &[PathBuf]) -> Result<(), ScanError> {
    if roots.is_empty() {
        return Err(ScanError::invalid_config("At least one root is required"));
    }
    if roots.iter().any(|r| r.as_os_str().is_empty()) {
        return Err(ScanError::invalid_config("Root path cannot be empty"));
    }
    Ok(())
}

impl AnalyzeConfig {
    /// Create a new config builder.
    pub fn builder() -> AnalyzeConfigBuilder {
        AnalyzeConfigBuilder::default()
    }

    /// Create a simple config for the given roots.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            warn_unreadable: false,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
        }
    }

    /// Mode implied by the number of roots.
    pub fn mode(&self) -> RootMode {
        RootMode::for_root_count(self.roots.len())
    }

    /// Check a config that did not go through the builder.
    pub fn validate(&self) -> Result<(), ScanError> {
        check_roots(&self.roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = AnalyzeConfig::builder()
            .roots(vec![PathBuf::from("/a"), PathBuf::from("/b")])
            .warn_unreadable(true)
            .build()
            .unwrap();

        assert_eq!(config.roots.len(), 2);
        assert!(config.warn_unreadable);
        assert_eq!(config.mmap_threshold, DEFAULT_MMAP_THRESHOLD);
        assert_eq!(config.mode(), RootMode::Multi);
    }

    #[test]
    fn test_config_simple() {
        let config = AnalyzeConfig::new(["/home/user"]);
        assert_eq!(config.roots, vec![PathBuf::from("/home/user")]);
        assert!(!config.warn_unreadable);
        assert_eq!(config.mode(), RootMode::Single);
        assert!(!config.mode().requires_cross_group());
    }

    #[test]
    fn test_validate_direct_config() {
        assert!(AnalyzeConfig::new(["/a"]).validate().is_ok());
        assert!(matches!(
            AnalyzeConfig::new(Vec::<PathBuf>::new()).validate(),
            Err(ScanError::InvalidConfig { .. })
        ));
        assert!(matches!(
            AnalyzeConfig::new([""]).validate(),
            Err(ScanError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_missing_roots() {
        assert!(AnalyzeConfig::builder().build().is_err());
        assert!(AnalyzeConfig::builder().roots(Vec::<PathBuf>::new()).build().is_err());
        assert!(
            AnalyzeConfig::builder()
                .roots(vec![PathBuf::new()])
                .build()
                .is_err()
        );
    }
}
