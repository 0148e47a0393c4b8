// src/commands/inspect.rs

//! Side-effect free commands: requirements, toolchain, validate, info

use super::{load_recipe, load_request, planning_kitchen, print_json, system_kitchen};
use crate::cli::{RecipeArgs, WorkspaceArgs};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use up_kitchen::recipe::options::OptionSchema;
use up_kitchen::recipe::validate_recipe;

/// Print the requirement list for a configuration
pub fn cmd_requirements(recipe_args: &RecipeArgs, json: bool) -> Result<()> {
    let (recipe, request) = load_request(recipe_args)?;
    let plan = planning_kitchen()?.prepare(&recipe, &request)?;

    if json {
        return print_json(&plan.requirements);
    }

    println!("{} {} ({})", plan.package, plan.version, plan.options);
    for requirement in &plan.requirements {
        match requirement.activated_by {
            Some(option) => println!("  {}  [{}]", requirement, option),
            None => println!("  {}", requirement),
        }
    }
    Ok(())
}

/// Print the toolchain variables for a configuration
pub fn cmd_toolchain(
    recipe_args: &RecipeArgs,
    workspace: &WorkspaceArgs,
    json: bool,
    cmake_script: bool,
) -> Result<()> {
    let (recipe, request) = load_request(recipe_args)?;
    let plan = system_kitchen(workspace)?.prepare(&recipe, &request)?;

    if json {
        return print_json(&plan.toolchain);
    }
    if cmake_script {
        print!("{}", plan.toolchain.to_cmake_script());
        return Ok(());
    }

    for (name, value) in plan.toolchain.iter() {
        println!("{}={}", name, value);
    }
    Ok(())
}

/// Check the recipe and the configuration without touching disk or network
pub fn cmd_validate(recipe_args: &RecipeArgs) -> Result<()> {
    let (recipe, request) = load_request(recipe_args)?;
    let plan = planning_kitchen()?.prepare(&recipe, &request)?;

    for warning in &plan.warnings {
        println!("Warning: {}", warning);
    }
    println!(
        "[OK] {} {} is buildable with {} {} on {} ({})",
        plan.package,
        plan.version,
        plan.settings.compiler.kind,
        plan.settings.compiler.version,
        plan.settings.os,
        plan.options
    );
    Ok(())
}

#[derive(Serialize)]
struct RecipeInfo<'a> {
    name: &'a str,
    description: Option<&'a str>,
    license: Option<&'a str>,
    homepage: Option<&'a str>,
    topics: &'a [String],
    versions: Vec<&'a str>,
    options: Vec<OptionInfo>,
    cross_channel: Option<&'a str>,
    proto_path: String,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct OptionInfo {
    name: String,
    allowed: String,
    default: String,
}

/// Show recipe metadata
pub fn cmd_info(recipe_path: &Path, json: bool) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    let warnings = validate_recipe(&recipe)?;
    let schema = OptionSchema::for_recipe(&recipe)?;

    let info = RecipeInfo {
        name: &recipe.package.name,
        description: recipe.package.description.as_deref(),
        license: recipe.package.license.as_deref(),
        homepage: recipe.package.homepage.as_deref(),
        topics: &recipe.package.topics,
        versions: recipe.known_versions(),
        options: schema
            .decls()
            .iter()
            .map(|d| OptionInfo {
                name: d.name.to_string(),
                allowed: d.allowed.to_string(),
                default: d.default.to_string(),
            })
            .collect(),
        cross_channel: recipe.package.cross_channel.as_deref(),
        proto_path: recipe.layout.proto_path(),
        warnings,
    };

    if json {
        return print_json(&info);
    }

    println!("Recipe: {}", info.name);
    if let Some(desc) = info.description {
        println!("  Description: {}", desc);
    }
    if let Some(license) = info.license {
        println!("  License: {}", license);
    }
    if let Some(homepage) = info.homepage {
        println!("  Homepage: {}", homepage);
    }
    if !info.topics.is_empty() {
        println!("  Topics: {}", info.topics.join(", "));
    }
    println!("  Versions: {}", info.versions.join(", "));
    if let Some(channel) = info.cross_channel {
        println!("  Cross-compiling channel: {}", channel);
    }
    println!("  Protocol path: {}", info.proto_path);
    println!("  Options:");
    for option in &info.options {
        println!("    {} = {} ({})", option.name, option.default, option.allowed);
    }
    for warning in &info.warnings {
        println!("Warning: {}", warning);
    }
    Ok(())
}
