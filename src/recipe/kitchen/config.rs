// src/recipe/kitchen/config.rs

//! Configuration and result types for the Kitchen

use crate::recipe::kitchen::cook::CookStage;
use crate::recipe::kitchen::hygiene::ArtifactSet;
use crate::recipe::kitchen::source::{GitTransport, ResolvedSources, SourcePlan};
use crate::recipe::layout::Layout;
use crate::recipe::options::{OptionSet, OptionValue};
use crate::recipe::package_info::PackageInfo;
use crate::recipe::requirements::Requirement;
use crate::recipe::settings::Settings;
use crate::recipe::toolchain::ToolchainVariables;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration for the Kitchen
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    /// Root of the source/build/install trees
    pub workspace: PathBuf,
    /// Directory for downloaded archives
    pub source_cache: PathBuf,
    /// Number of parallel build jobs
    pub jobs: usize,
    /// Protocol repository transport
    pub transport: GitTransport,
    /// Explicit cmake program; looked up on PATH when unset
    pub cmake: Option<PathBuf>,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);

        Self {
            workspace: PathBuf::from("up-kitchen-build"),
            source_cache: default_source_cache(),
            jobs,
            transport: GitTransport::default(),
            cmake: None,
        }
    }
}

impl KitchenConfig {
    /// Configuration for a workspace, with the transport taken from the environment
    pub fn for_workspace(workspace: &Path) -> Self {
        Self {
            workspace: workspace.to_path_buf(),
            transport: GitTransport::from_env(),
            ..Self::default()
        }
    }
}

/// `<cache dir>/up-kitchen/sources`, or a relative fallback without a home
pub fn default_source_cache() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("up-kitchen").join("sources"))
        .unwrap_or_else(|| PathBuf::from(".up-kitchen-cache/sources"))
}

/// What to cook: a recipe version under concrete settings and option overrides
#[derive(Debug, Clone, Default)]
pub struct CookRequest {
    pub version: String,
    pub settings: Settings,
    /// Raw `name=value` overrides, validated against the recipe's schema
    pub options: BTreeMap<String, OptionValue>,
}

impl CookRequest {
    pub fn new(version: impl Into<String>, settings: Settings) -> Self {
        Self {
            version: version.into(),
            settings,
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, name: &str, value: OptionValue) -> Self {
        self.options.insert(name.to_string(), value);
        self
    }
}

/// Everything derived from a request before any side effect
#[derive(Debug, Clone, Serialize)]
pub struct CookPlan {
    pub package: String,
    pub version: String,
    pub settings: Settings,
    pub options: OptionSet,
    pub requirements: Vec<Requirement>,
    pub toolchain: ToolchainVariables,
    #[serde(skip)]
    pub layout: Layout,
    #[serde(skip)]
    pub sources: SourcePlan,
    /// Non-fatal recipe warnings
    pub warnings: Vec<String>,
}

/// Result of cooking a recipe
#[derive(Debug, Clone, Serialize)]
pub struct CookResult {
    pub plan: CookPlan,
    pub sources: ResolvedSources,
    /// Last stage reached; always `Packaged` on success
    pub stage: CookStage,
    /// Package tree
    pub package_dir: PathBuf,
    /// Files in the package tree after cleanup
    pub artifacts: ArtifactSet,
    /// Paths removed by the cleanup stage
    pub removed: Vec<PathBuf>,
    pub package_info: PackageInfo,
    /// Build log
    pub log: String,
}
