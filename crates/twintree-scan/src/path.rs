//! Lexical path cleaning for root arguments.

use std::path::{Component, Path, PathBuf};

/// Clean a path lexically, without touching the filesystem.
///
/// Repeated separators, `.` segments and trailing separators are dropped and
/// `name/..` pairs are folded. Leading `..` segments of a relative path are
/// kept; `..` directly below the filesystem root is dropped. An empty result
/// becomes `.`.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}
