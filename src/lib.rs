// src/lib.rs

//! up-kitchen: recipe engine for the uProtocol C++ library
//!
//! Turns a declarative recipe plus a settings/options selection into a
//! reproducible, redistributable package tree with consumer metadata.
//!
//! # Architecture
//!
//! - Validation first: nothing touches disk or network until the option set
//!   and toolchain have been checked
//! - Dual sources: a checksummed archive plus a tag-pinned protocol repository
//! - Capabilities: fetching and the native build tool sit behind traits

mod error;
pub mod hash;
pub mod recipe;
pub mod version;

pub use error::{Error, Result};
pub use hash::Sha256Digest;
pub use recipe::{CookRequest, CookResult, Kitchen, KitchenConfig, Recipe, Settings};
pub use version::DottedVersion;
