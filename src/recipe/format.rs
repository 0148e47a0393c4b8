// src/recipe/format.rs

//! Recipe file format definitions
//!
//! A recipe is a TOML file. Besides package metadata it carries a
//! version-keyed data table: for each released version, where the primary
//! archive lives, which protocol repository tag belongs to it, and which
//! patches must be applied.

use crate::recipe::options::OptionValue;
use crate::recipe::requirements::DependencyPins;
use crate::version::DottedVersion;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// A complete recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Where the protocol repository lands inside the primary tree
    #[serde(default)]
    pub layout: LayoutSection,

    /// Option default overrides, keyed by option name
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,

    /// Compiler and language standard floor
    #[serde(default)]
    pub validation: ValidationSection,

    /// Pinned versions of the external packages this recipe requires
    #[serde(default)]
    pub dependencies: DependencyPins,

    /// Per-version source data
    #[serde(default)]
    pub versions: BTreeMap<String, VersionData>,

    /// Directory the recipe was loaded from; patch files resolve against it
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Recipe {
    /// Look up the data table entry for a recipe version
    pub fn version_data(&self, version: &str) -> Option<&VersionData> {
        self.versions.get(version)
    }

    /// Versions this recipe knows how to build, in ascending key order
    pub fn known_versions(&self) -> Vec<&str> {
        self.versions.keys().map(|s| s.as_str()).collect()
    }

    /// Highest declared version, compared as dotted numbers
    ///
    /// Keys that do not parse as dotted versions sort below every key that does.
    pub fn latest_version(&self) -> Option<&str> {
        self.versions
            .keys()
            .max_by(|a, b| {
                let parse = |s: &str| DottedVersion::parse(s.trim_start_matches('v')).ok();
                match (parse(a), parse(b)) {
                    (Some(va), Some(vb)) => va.cmp(&vb),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => a.cmp(b),
                }
            })
            .map(String::as_str)
    }

    /// Whether this recipe variant declares the cross-compiling option
    pub fn supports_cross_compiling(&self) -> bool {
        self.package.cross_channel.is_some()
    }

    /// Resolve a patch entry to a path on disk
    pub fn patch_path(&self, patch: &PatchInfo) -> PathBuf {
        self.base_dir.join(&patch.patch_file)
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Upstream homepage
    #[serde(default)]
    pub homepage: Option<String>,

    /// Where the recipe itself is maintained
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(default = "default_package_type")]
    pub package_type: String,

    /// Minimum engine version, as a semver requirement (">=0.1.0")
    #[serde(default)]
    pub required_version: Option<String>,

    /// Channel suffix of the cross-compiling build variant ("cross/cross")
    ///
    /// Declaring it adds the `build_cross_compiling` option.
    #[serde(default)]
    pub cross_channel: Option<String>,

    /// License file copied from the source tree into the package
    #[serde(default = "default_license_file")]
    pub license_file: String,
}

fn default_package_type() -> String {
    "library".to_string()
}

fn default_license_file() -> String {
    "LICENSE".to_string()
}

/// Layout of the protocol schema inside the primary source tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutSection {
    /// Subpath of the primary tree the protocol repository is cloned into
    #[serde(default = "default_proto_containing_folder")]
    pub proto_containing_folder: String,

    /// Subfolder of the protocol repository holding the schema tree
    #[serde(default = "default_proto_subfolder")]
    pub proto_subfolder: String,

    /// Fixed internal folder name of the schema files
    #[serde(default = "default_proto_folder")]
    pub proto_folder: String,
}

fn default_proto_containing_folder() -> String {
    "up-core-api".to_string()
}

fn default_proto_subfolder() -> String {
    ".".to_string()
}

fn default_proto_folder() -> String {
    "uprotocol".to_string()
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            proto_containing_folder: default_proto_containing_folder(),
            proto_subfolder: default_proto_subfolder(),
            proto_folder: default_proto_folder(),
        }
    }
}

impl LayoutSection {
    /// Relative path of the clone target inside the primary tree
    pub fn proto_checkout_dir(&self) -> PathBuf {
        PathBuf::from(&self.proto_containing_folder)
    }

    /// Relative schema path handed to the build, with `.` components elided
    ///
    /// Always uses `/` separators so the value is identical on every host.
    pub fn proto_path(&self) -> String {
        let joined = Path::new(&self.proto_containing_folder)
            .join(&self.proto_subfolder)
            .join(&self.proto_folder);

        joined
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Compiler floor applied by the validator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationSection {
    /// Minimum C++ standard level (14 means C++14)
    #[serde(default = "default_min_cppstd")]
    pub min_cppstd: u16,

    /// Minimum compiler version able to build `min_cppstd`, keyed by compiler name
    #[serde(default = "default_compiler_minimums")]
    pub compilers: BTreeMap<String, String>,
}

fn default_min_cppstd() -> u16 {
    14
}

fn default_compiler_minimums() -> BTreeMap<String, String> {
    [
        ("apple-clang", "13"),
        ("clang", "13"),
        ("gcc", "11"),
        ("msvc", "191"),
        ("Visual Studio", "15"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            min_cppstd: default_min_cppstd(),
            compilers: default_compiler_minimums(),
        }
    }
}

/// Everything needed to acquire one recipe version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionData {
    /// Primary source archive
    pub source: ArchiveSource,

    /// Protocol repository pin
    pub proto: ProtoSource,

    /// Patches applied in order before configuring
    #[serde(default)]
    pub patches: Vec<PatchInfo>,
}

/// Primary source archive reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveSource {
    /// Archive URL
    pub url: String,

    /// SHA-256 of the archive (hex)
    pub sha256: String,

    /// Drop the archive's top-level wrapper directory on extraction
    #[serde(default = "default_strip_root")]
    pub strip_root: bool,
}

fn default_strip_root() -> bool {
    true
}

/// Protocol repository reference
///
/// Every key other than `tag` is a transport name mapped to a clone URL,
/// e.g. `https = "https://..."`, `ssh = "git@..."`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtoSource {
    /// Tag checked out after cloning; never a branch
    pub tag: String,

    /// Clone URLs keyed by transport name
    #[serde(flatten)]
    pub urls: BTreeMap<String, String>,
}

impl ProtoSource {
    /// Clone URL for a transport key
    pub fn url_for(&self, transport: &str) -> Option<&str> {
        self.urls.get(transport).map(|s| s.as_str())
    }
}

/// Information about a single patch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchInfo {
    /// Patch file, relative to the recipe directory
    pub patch_file: String,

    #[serde(default)]
    pub patch_description: Option<String>,

    /// Patch category ("portability", "bugfix", "conan", ...)
    #[serde(default)]
    pub patch_type: Option<String>,

    /// Strip level for patch (default: 1)
    #[serde(default = "default_strip")]
    pub strip: u32,
}

fn default_strip() -> u32 {
    1
}
