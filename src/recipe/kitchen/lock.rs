// src/recipe/kitchen/lock.rs

//! Exclusive workspace lock
//!
//! One recipe run owns the source, build and install trees of a workspace
//! for its whole duration. The lock is an advisory `flock(LOCK_EX)` on a file
//! at the workspace root, released when the guard drops.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Held lock on a workspace
#[derive(Debug)]
pub struct BuildLock {
    file: File,
    path: PathBuf,
}

impl BuildLock {
    /// Take the lock without blocking
    ///
    /// Fails with `ConfigurationError` when another run holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired workspace lock at {}", path.display());
                Ok(Self {
                    file,
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(Error::ConfigurationError(
                format!(
                    "Workspace is in use by another run (lock held at {})",
                    path.display()
                ),
            )),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released workspace lock at {}", self.path.display());
    }
}
