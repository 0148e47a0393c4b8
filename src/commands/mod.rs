// src/commands/mod.rs
//! Command handlers for the up-kitchen CLI

mod cook;
mod inspect;

pub use cook::{cmd_cook, cmd_source};
pub use inspect::{cmd_info, cmd_requirements, cmd_toolchain, cmd_validate};

use crate::cli::{RecipeArgs, WorkspaceArgs};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use up_kitchen::recipe::options::parse_option_overrides;
use up_kitchen::recipe::{Profile, Recipe, parse_recipe_file};
use up_kitchen::{CookRequest, Kitchen, KitchenConfig, Settings};

/// Load the recipe and assemble the request from profile and CLI overrides
///
/// Layering, later wins: recipe option defaults, profile, `-s`/`-o` arguments.
pub(crate) fn load_request(args: &RecipeArgs) -> Result<(Recipe, CookRequest)> {
    let recipe = load_recipe(&args.recipe)?;

    let version = match &args.version {
        Some(v) => v.clone(),
        None => recipe
            .latest_version()
            .map(str::to_string)
            .with_context(|| format!("{} declares no versions", recipe.package.name))?,
    };

    let mut settings = if args.no_detect {
        Settings::default()
    } else {
        Settings::detect()
    };

    let mut options = BTreeMap::new();

    if let Some(path) = &args.profile {
        let profile = Profile::load(path)
            .with_context(|| format!("Failed to load profile: {}", path.display()))?;
        settings.apply_profile(&profile)?;
        options.extend(profile.options);
    }

    settings
        .apply_args(&args.settings)
        .context("Invalid setting override")?;
    options.extend(parse_option_overrides(&args.options).context("Invalid option override")?);

    debug!(
        "Settings: os={} arch={} build_type={} compiler={} {}",
        settings.os,
        settings.arch,
        settings.build_type,
        settings.compiler.kind,
        settings.compiler.version
    );

    let mut request = CookRequest::new(version, settings);
    request.options = options;
    Ok((recipe, request))
}

pub(crate) fn load_recipe(path: &Path) -> Result<Recipe> {
    parse_recipe_file(path).with_context(|| format!("Failed to parse recipe: {}", path.display()))
}

/// Kitchen backed by the network fetcher and CMake
pub(crate) fn system_kitchen(workspace: &WorkspaceArgs) -> Result<Kitchen> {
    let mut config = KitchenConfig::for_workspace(&workspace.workspace);
    if let Some(cache) = &workspace.source_cache {
        config.source_cache = cache.clone();
    }
    if let Some(jobs) = workspace.jobs {
        config.jobs = jobs;
    }
    config.cmake = workspace.cmake.clone();

    Kitchen::with_system_tools(config).context("Failed to set up the kitchen")
}

/// Kitchen for commands that only resolve a configuration
pub(crate) fn planning_kitchen() -> Result<Kitchen> {
    system_kitchen(&WorkspaceArgs {
        workspace: "up-kitchen-build".into(),
        source_cache: None,
        jobs: None,
        cmake: None,
    })
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
