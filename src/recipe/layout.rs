// src/recipe/layout.rs

//! Folder layout of one recipe workspace
//!
//! ```text
//! <workspace>/
//!   src/                 primary tree (archive), protocol repo nested inside
//!   build/<build_type>/  build tree
//!   install/             install tree, pruned into the package
//! ```

use crate::recipe::settings::BuildType;
use std::path::{Path, PathBuf};

/// Name of the lock file kept at the workspace root
pub const LOCK_FILE_NAME: &str = ".up-kitchen.lock";

/// Resolved folders for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_dir: PathBuf,
}

impl Layout {
    pub fn new(root: &Path, build_type: BuildType) -> Self {
        Self {
            root: root.to_path_buf(),
            source_dir: root.join("src"),
            build_dir: root.join("build").join(build_type.to_string()),
            install_dir: root.join("install"),
        }
    }

    /// Generated toolchain file inside the build tree
    pub fn toolchain_file(&self) -> PathBuf {
        self.build_dir.join("up_toolchain.cmake")
    }

    /// Where installed libraries are discovered
    pub fn lib_dir(&self) -> PathBuf {
        self.install_dir.join("lib")
    }

    pub fn licenses_dir(&self) -> PathBuf {
        self.install_dir.join("licenses")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }
}
