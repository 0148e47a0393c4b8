// src/recipe/package_info.rs

//! Consumer-facing linkage metadata for a packaged build
//!
//! Library names are discovered from the package's `lib/` directory rather
//! than hard-coded: what got built depends on the options.

use crate::error::Result;
use crate::recipe::format::Recipe;
use crate::recipe::requirements::Requirement;
use crate::recipe::settings::Settings;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Extensions recognized as linkable libraries
const LIBRARY_EXTENSIONS: &[&str] = &["so", "lib", "a", "dylib", "bc"];

/// System libraries POSIX-like targets link separately
const POSIX_SYSTEM_LIBS: &[&str] = &["m", "pthread", "dl"];

/// Metadata published for consumers of the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    /// Library names found in the package, without prefix or extension
    pub libs: Vec<String>,
    /// Extra system libraries for the link line
    pub system_libs: Vec<String>,
    /// Components of the always-required dependencies
    pub requires: Vec<String>,
    /// Discovery names (`cmake_file_name`, `cmake_target_name`, `pkg_config_name`)
    pub properties: BTreeMap<String, String>,
    /// Legacy generator names
    pub names: BTreeMap<String, String>,
}

impl PackageInfo {
    /// Assemble metadata for a package whose libraries live in `lib_dir`
    pub fn collect(
        recipe: &Recipe,
        version: &str,
        settings: &Settings,
        requirements: &[Requirement],
        lib_dir: &Path,
    ) -> Result<Self> {
        let name = recipe.package.name.clone();

        let libs = collect_libs(lib_dir)?;
        debug!("Collected libraries: {}", libs.join(", "));

        let system_libs = if settings.os.needs_posix_system_libs() {
            POSIX_SYSTEM_LIBS.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        };

        let requires = requirements
            .iter()
            .filter(|r| r.is_always_required())
            .map(Requirement::component)
            .collect();

        let mut properties = BTreeMap::new();
        properties.insert("cmake_file_name".to_string(), name.clone());
        properties.insert("cmake_target_name".to_string(), format!("{}::{}", name, name));
        properties.insert("pkg_config_name".to_string(), name.clone());

        let mut names = BTreeMap::new();
        names.insert("cmake_find_package".to_string(), name.clone());
        names.insert("cmake_find_package_multi".to_string(), name.clone());

        Ok(Self {
            name,
            version: version.to_string(),
            libs,
            system_libs,
            requires,
            properties,
            names,
        })
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Library names in `lib_dir`, sorted and deduplicated
///
/// `libup-cpp.a` and `libup-cpp.so` both yield `up-cpp`; `.lib` files keep
/// any `lib` prefix since it is part of the MSVC name. Versioned shared
/// objects (`.so.1`) are skipped in favour of their unversioned link. A
/// missing directory yields an empty list.
pub fn collect_libs(lib_dir: &Path) -> Result<Vec<String>> {
    if !lib_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut libs = BTreeSet::new();
    for entry in fs::read_dir(lib_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }

        let path = entry.path();
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };

        if !LIBRARY_EXTENSIONS.contains(&ext) {
            continue;
        }

        let name = match stem.strip_prefix("lib") {
            Some(rest) if ext != "lib" && !rest.is_empty() => rest,
            _ => stem,
        };
        libs.insert(name.to_string());
    }

    Ok(libs.into_iter().collect())
}
