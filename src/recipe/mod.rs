// src/recipe/mod.rs

//! Recipe system for building a native library from two source trees
//!
//! A recipe describes how to obtain, configure, build and publish one
//! library whose sources are split between a primary archive and a
//! separately versioned protocol-schema repository.
//!
//! # Culinary Terminology
//!
//! - **Recipe**: the declarative build description (TOML)
//! - **Kitchen**: runs the whole pipeline for one recipe version
//! - **Cook**: the build/package stages over an acquired source tree
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "up-cpp"
//! description = "C++ uProtocol library"
//! license = "Apache-2.0"
//! homepage = "https://github.com/eclipse-uprotocol/up-cpp"
//! cross_channel = "cross/cross"
//!
//! [options]
//! shared = false
//!
//! [versions."0.1.0".source]
//! url = "https://github.com/eclipse-uprotocol/up-cpp/archive/refs/tags/v0.1.0.tar.gz"
//! sha256 = "..."
//!
//! [versions."0.1.0".proto]
//! tag = "v1.5.6"
//! https = "https://github.com/eclipse-uprotocol/up-core-api.git"
//! ssh = "git@github.com:eclipse-uprotocol/up-core-api.git"
//!
//! [[versions."0.1.0".patches]]
//! patch_file = "patches/0001-fix-install.patch"
//! patch_description = "Install generated headers"
//! patch_type = "conan"
//! ```

mod format;
pub mod kitchen;
pub mod layout;
pub mod options;
pub mod package_info;
pub mod parser;
pub mod requirements;
pub mod settings;
pub mod toolchain;
pub mod validate;

pub use format::{
    ArchiveSource, LayoutSection, PackageSection, PatchInfo, ProtoSource, Recipe, ValidationSection,
    VersionData,
};
pub use kitchen::{
    BuildTool, CookPlan, CookRequest, CookResult, CookStage, Kitchen, KitchenConfig, SourceFetcher,
};
pub use layout::Layout;
pub use options::{OptionName, OptionSet, OptionValue};
pub use package_info::{PackageInfo, collect_libs};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
pub use requirements::{DependencyPins, Requirement, RequirementVariant, project_requirements};
pub use settings::{BuildType, CompilerKind, Os, Profile, Settings};
pub use toolchain::{ToolchainValue, ToolchainVariables, generate_toolchain};
pub use validate::validate_configuration;
