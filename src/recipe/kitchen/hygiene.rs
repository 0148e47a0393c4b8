// src/recipe/kitchen/hygiene.rs

//! Install tree hygiene
//!
//! Consumers get their discovery files from the published metadata, so the
//! generator-private `cmake`/`pkgconfig` directories, the `share` tree and
//! build-only byproducts (libtool archives, debug symbols) are removed from
//! the install tree before it is packaged.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directories removed wholesale, relative to the install root
const PRIVATE_DIRS: &[&str] = &["lib/pkgconfig", "lib/cmake", "share"];

/// File patterns removed, relative to the install root
const BYPRODUCT_PATTERNS: &[&str] = &["lib/*.la", "lib/*.pdb", "bin/*.pdb"];

/// Relative paths of every file in an install tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    pub files: BTreeSet<PathBuf>,
}

impl ArtifactSet {
    pub fn scan(root: &Path) -> Result<Self> {
        let mut files = BTreeSet::new();
        if !root.exists() {
            return Ok(Self { files });
        }

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.insert(relative.to_path_buf());
            }
        }
        Ok(Self { files })
    }

    pub fn contains(&self, relative: impl AsRef<Path>) -> bool {
        self.files.contains(relative.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Remove generator metadata and build byproducts from an install tree
///
/// Returns the removed paths, relative to `install_dir`, in removal order.
/// Running it twice is a no-op the second time.
pub fn prune_install_tree(install_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for dir in PRIVATE_DIRS {
        let path = install_dir.join(dir);
        if path.is_dir() {
            debug!("Removing {}", path.display());
            fs::remove_dir_all(&path)?;
            removed.push(PathBuf::from(dir));
        }
    }

    // The workspace path may itself contain glob metacharacters
    let root = glob::Pattern::escape(&install_dir.to_string_lossy());
    for pattern in BYPRODUCT_PATTERNS {
        let full = format!("{}/{}", root.trim_end_matches('/'), pattern);
        let paths = glob::glob(&full).map_err(|e| {
            Error::ParseError(format!("Invalid cleanup pattern {}: {}", pattern, e))
        })?;

        for path in paths.flatten() {
            if !path.is_file() {
                continue;
            }
            debug!("Removing {}", path.display());
            fs::remove_file(&path)?;
            if let Ok(relative) = path.strip_prefix(install_dir) {
                removed.push(relative.to_path_buf());
            }
        }
    }

    Ok(removed)
}
