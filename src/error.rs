// src/error.rs

//! Error types for the recipe engine
//!
//! Every variant aborts the recipe run. Nothing here is ever downgraded to a
//! warning: a published binary is only correct when every phase succeeded.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while executing a recipe
#[derive(Error, Debug)]
pub enum Error {
    /// Unsupported compiler, standard, platform or option combination
    ///
    /// Raised before any network or filesystem action takes place.
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    /// Archive fetch, VCS clone or checkout failed
    ///
    /// Safe to retry from scratch: acquisition always clears its target first.
    #[error("Source acquisition failed: {0}")]
    AcquisitionError(String),

    /// A declared patch did not apply to the acquired tree
    #[error("Failed to apply patch '{patch}': {reason}")]
    PatchError { patch: String, reason: String },

    /// The external build tool reported failure
    ///
    /// The diagnostic is the tool's own output, passed through untouched.
    #[error("{step} step failed ({status}):\n{diagnostic}")]
    BuildToolError {
        step: String,
        status: String,
        diagnostic: String,
    },

    /// Malformed recipe, profile, setting or option input
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Archive digest did not match the recipe
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Filesystem failure outside of source acquisition
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short category name, matching the error taxonomy
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationError(_) => "ConfigurationError",
            Self::AcquisitionError(_) | Self::ChecksumMismatch { .. } => "AcquisitionError",
            Self::PatchError { .. } => "PatchError",
            Self::BuildToolError { .. } => "BuildToolError",
            Self::ParseError(_) => "ParseError",
            Self::Io(_) => "IoError",
        }
    }

    /// Wrap an I/O failure that happened while acquiring sources
    pub(crate) fn acquisition(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::AcquisitionError(format!("{context}: {err}"))
    }
}
