// src/recipe/parser.rs

//! Recipe file parsing and load-time validation
//!
//! Validation catches every missing or malformed key of the version-keyed
//! data table before the engine performs any side effect.

use crate::error::{Error, Result};
use crate::hash::Sha256Digest;
use crate::recipe::format::Recipe;
use crate::recipe::options::OptionSchema;
use crate::version::{DottedVersion, check_required_version, engine_version};
use std::path::Path;

/// Transport key every protocol repository entry must provide
pub const DEFAULT_TRANSPORT: &str = "https";

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
///
/// Patch paths in the recipe resolve against the file's directory.
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::ParseError(format!("Failed to read recipe file {}: {}", path.display(), e))
    })?;

    let mut recipe = parse_recipe(&content)?;
    // Patches are applied from inside the source tree, so this must not stay relative
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    recipe.base_dir = std::path::absolute(parent)?;
    Ok(recipe)
}

/// Validate a recipe for completeness and correctness
///
/// Returns non-fatal warnings; anything that would break a later phase is an
/// error.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(Error::ParseError("Recipe package name cannot be empty".to_string()));
    }

    if let Some(requirement) = &recipe.package.required_version {
        check_required_version(requirement, &engine_version())?;
    }

    if let Some(channel) = &recipe.package.cross_channel
        && !is_valid_channel(channel)
    {
        return Err(Error::ParseError(format!(
            "Invalid cross_channel '{}', expected user/channel",
            channel
        )));
    }

    // Option defaults must name declared options
    OptionSchema::for_recipe(recipe)?;

    for (compiler, version) in &recipe.validation.compilers {
        DottedVersion::parse(version).map_err(|e| {
            Error::ParseError(format!("Minimum version for compiler '{}': {}", compiler, e))
        })?;
    }

    if recipe.versions.is_empty() {
        warnings.push("Recipe declares no versions".to_string());
    }

    for (version, data) in &recipe.versions {
        url::Url::parse(&data.source.url).map_err(|e| {
            Error::ParseError(format!(
                "Version {}: invalid source url '{}': {}",
                version, data.source.url, e
            ))
        })?;

        Sha256Digest::parse(&data.source.sha256).map_err(|e| {
            Error::ParseError(format!("Version {}: invalid sha256: {}", version, e))
        })?;

        if data.proto.tag.trim().is_empty() {
            return Err(Error::ParseError(format!(
                "Version {}: protocol repository tag cannot be empty",
                version
            )));
        }

        if data.proto.url_for(DEFAULT_TRANSPORT).is_none() {
            return Err(Error::ParseError(format!(
                "Version {}: protocol repository has no '{}' url",
                version, DEFAULT_TRANSPORT
            )));
        }

        for patch in &data.patches {
            if patch.patch_file.trim().is_empty() {
                return Err(Error::ParseError(format!(
                    "Version {}: patch entry has an empty patch_file",
                    version
                )));
            }
            if patch.patch_description.is_none() {
                warnings.push(format!(
                    "Version {}: patch {} has no description",
                    version, patch.patch_file
                ));
            }
        }
    }

    if recipe.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }

    Ok(warnings)
}

fn is_valid_channel(channel: &str) -> bool {
    match channel.split_once('/') {
        Some((user, chan)) => {
            !user.is_empty() && !chan.is_empty() && !chan.contains('/')
        }
        None => false,
    }
}
