// src/recipe/kitchen/mod.rs

//! Kitchen: runs a recipe from option resolution to a published package
//!
//! Control flow, strictly sequential:
//!
//! 1. **Prepare** (no side effects): load-time recipe checks, option
//!    resolution with platform defaulting, configuration validation,
//!    requirement projection, toolchain generation, source plan lookup.
//! 2. **Acquire**: take the workspace lock, fetch the primary archive,
//!    replace the protocol subpath with a fresh clone at the pinned tag.
//! 3. **Cook**: patch, configure, build, install, clean, package.
//! 4. **Publish**: collect consumer metadata from the package tree.
//!
//! Any failure aborts the run. Validation failures are reported before the
//! workspace is touched.

mod archive;
mod build_tool;
mod config;
mod cook;
mod hygiene;
mod lock;
mod source;

pub use archive::{apply_patch, extract_archive};
pub use build_tool::{BuildTool, CMake};
pub use config::{CookPlan, CookRequest, CookResult, KitchenConfig, default_source_cache};
pub use cook::{Cook, CookStage};
pub use hygiene::{ArtifactSet, prune_install_tree};
pub use lock::BuildLock;
pub use source::{
    GIT_METHOD_ENV, GitTransport, NetworkFetcher, ResolvedSources, SourceFetcher, SourceOrigin,
    SourcePlan, SourceTree, resolve_sources,
};

use crate::error::Result;
use crate::recipe::format::Recipe;
use crate::recipe::layout::Layout;
use crate::recipe::options::{OptionSchema, resolve_options};
use crate::recipe::package_info::PackageInfo;
use crate::recipe::parser::validate_recipe;
use crate::recipe::requirements::project_requirements;
use crate::recipe::toolchain::generate_toolchain;
use crate::recipe::validate::validate_configuration;
use tracing::{debug, info, warn};

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    fetcher: Box<dyn SourceFetcher>,
    build_tool: Box<dyn BuildTool>,
}

impl Kitchen {
    /// Create a Kitchen with explicit collaborators
    pub fn new(
        config: KitchenConfig,
        fetcher: Box<dyn SourceFetcher>,
        build_tool: Box<dyn BuildTool>,
    ) -> Self {
        Self {
            config,
            fetcher,
            build_tool,
        }
    }

    /// Create a Kitchen that downloads over HTTP, clones with git and builds with CMake
    pub fn with_system_tools(config: KitchenConfig) -> Result<Self> {
        let fetcher = NetworkFetcher::new(config.source_cache.clone())?;
        let cmake = match &config.cmake {
            Some(program) => CMake::new().with_program(program),
            None => CMake::new(),
        };
        Ok(Self::new(config, Box::new(fetcher), Box::new(cmake)))
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Derive everything a run needs without touching disk or network
    pub fn prepare(&self, recipe: &Recipe, request: &CookRequest) -> Result<CookPlan> {
        let warnings = validate_recipe(recipe)?;
        for warning in &warnings {
            warn!("{}", warning);
        }

        let schema = OptionSchema::for_recipe(recipe)?;
        let options = resolve_options(&schema, &request.options, &request.settings)?;
        debug!("Active options: {}", options);

        validate_configuration(
            &recipe.package.name,
            &recipe.validation,
            &request.settings,
            &options,
        )?;

        let requirements = project_requirements(
            &recipe.dependencies,
            &options,
            recipe.package.cross_channel.as_deref(),
        );

        // Child processes run from other directories, so every layout path is absolute
        let workspace = std::path::absolute(&self.config.workspace)?;
        let layout = Layout::new(&workspace, request.settings.build_type);
        let toolchain = generate_toolchain(&request.settings, &options, &recipe.layout, &layout)?;
        let sources = SourcePlan::new(recipe, &request.version, self.config.transport.clone())?;

        Ok(CookPlan {
            package: recipe.package.name.clone(),
            version: request.version.clone(),
            settings: request.settings.clone(),
            options,
            requirements,
            toolchain,
            layout,
            sources,
            warnings,
        })
    }

    /// Validate and acquire both source trees, without building
    pub fn source(
        &self,
        recipe: &Recipe,
        request: &CookRequest,
    ) -> Result<(CookPlan, ResolvedSources)> {
        let plan = self.prepare(recipe, request)?;
        let _lock = BuildLock::acquire(&plan.layout.lock_file())?;
        let sources = self.acquire(&plan)?;
        Ok((plan, sources))
    }

    /// Cook a recipe version into a package tree
    pub fn cook(&self, recipe: &Recipe, request: &CookRequest) -> Result<CookResult> {
        info!("Cooking {} version {}", recipe.package.name, request.version);

        let plan = self.prepare(recipe, request)?;
        info!("Configuration valid: {}", plan.options);

        let _lock = BuildLock::acquire(&plan.layout.lock_file())?;
        let sources = self.acquire(&plan)?;

        let mut cook = Cook::new(
            recipe,
            &plan.settings,
            &plan.layout,
            &plan.toolchain,
            &plan.sources.patches,
            self.build_tool.as_ref(),
            self.config.jobs,
        );
        cook.run()?;
        let stage = cook.stage();
        let removed = cook.removed().to_vec();
        let log = cook.log().to_string();

        let package_dir = plan.layout.install_dir.clone();
        let package_info = PackageInfo::collect(
            recipe,
            &plan.version,
            &plan.settings,
            &plan.requirements,
            &plan.layout.lib_dir(),
        )?;
        let artifacts = ArtifactSet::scan(&package_dir)?;

        info!(
            "Packaged {} {} ({} files) at {}",
            plan.package,
            plan.version,
            artifacts.len(),
            package_dir.display()
        );

        Ok(CookResult {
            plan,
            sources,
            stage,
            package_dir,
            artifacts,
            removed,
            package_info,
            log,
        })
    }

    fn acquire(&self, plan: &CookPlan) -> Result<ResolvedSources> {
        info!("Acquiring sources for {} {}", plan.package, plan.version);
        resolve_sources(self.fetcher.as_ref(), &plan.sources, &plan.layout.source_dir)
    }
}
