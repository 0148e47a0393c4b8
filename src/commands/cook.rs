// src/commands/cook.rs

//! Cook and source commands

use super::{load_request, print_json, system_kitchen};
use crate::cli::{RecipeArgs, WorkspaceArgs};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Cook a recipe version into a package tree
pub fn cmd_cook(
    recipe_args: &RecipeArgs,
    workspace: &WorkspaceArgs,
    json: bool,
    metadata_out: Option<&Path>,
) -> Result<()> {
    let (recipe, request) = load_request(recipe_args)?;
    let kitchen = system_kitchen(workspace)?;

    if !json {
        println!(
            "Cooking {} {} in {}",
            recipe.package.name,
            request.version,
            workspace.workspace.display()
        );
    }

    let result = kitchen
        .cook(&recipe, &request)
        .with_context(|| format!("Failed to cook {} {}", recipe.package.name, request.version))?;

    if let Some(path) = metadata_out {
        let content = serde_json::to_string_pretty(&result.package_info)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write metadata: {}", path.display()))?;
        info!("Wrote package metadata to {}", path.display());
    }

    if json {
        return print_json(&result.package_info);
    }

    for warning in &result.plan.warnings {
        println!("Warning: {}", warning);
    }

    println!("\n[COMPLETE] Packaged {} {}", result.plan.package, result.plan.version);
    println!("  Package: {}", result.package_dir.display());
    println!("  Options: {}", result.plan.options);
    println!("  Requires:");
    for requirement in &result.plan.requirements {
        println!("    - {}", requirement);
    }
    println!("  Libraries: {}", result.package_info.libs.join(", "));
    if !result.package_info.system_libs.is_empty() {
        println!("  System libraries: {}", result.package_info.system_libs.join(", "));
    }
    if !result.removed.is_empty() {
        println!("  Cleaned:");
        for path in &result.removed {
            println!("    - {}", path.display());
        }
    }
    println!("  Files: {}", result.artifacts.len());

    Ok(())
}

/// Validate the configuration and acquire both source trees
pub fn cmd_source(recipe_args: &RecipeArgs, workspace: &WorkspaceArgs) -> Result<()> {
    let (recipe, request) = load_request(recipe_args)?;
    let kitchen = system_kitchen(workspace)?;

    let (plan, sources) = kitchen
        .source(&recipe, &request)
        .with_context(|| format!("Failed to acquire sources for {}", recipe.package.name))?;

    println!("[COMPLETE] Sources for {} {}", plan.package, plan.version);
    println!(
        "  Primary:   {} (sha256 {})",
        sources.primary.path.display(),
        sources.primary.revision
    );
    println!(
        "  Protocol:  {} (tag {}, via {})",
        sources.auxiliary.path.display(),
        sources.auxiliary.revision,
        plan.sources.transport
    );
    Ok(())
}
