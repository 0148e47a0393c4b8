// src/recipe/toolchain.rs

//! Projection of settings, options and layout into build variables
//!
//! Pure: nothing here touches the filesystem. The resulting set is rendered
//! into a CMake toolchain script by the kitchen at configure time.

use crate::error::Result;
use crate::recipe::format::LayoutSection;
use crate::recipe::layout::Layout;
use crate::recipe::options::{OptionName, OptionSet};
use crate::recipe::settings::Settings;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A single variable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolchainValue {
    Bool(bool),
    Str(String),
    Path(PathBuf),
}

impl ToolchainValue {
    /// CMake spelling (`ON`/`OFF` for booleans, forward slashes for paths)
    pub fn to_cmake(&self) -> String {
        match self {
            Self::Bool(true) => "ON".to_string(),
            Self::Bool(false) => "OFF".to_string(),
            Self::Str(s) => s.clone(),
            Self::Path(p) => p.to_string_lossy().replace('\\', "/"),
        }
    }

    fn cmake_cache_type(&self) -> &'static str {
        match self {
            Self::Bool(_) => "BOOL",
            Self::Str(_) => "STRING",
            Self::Path(_) => "PATH",
        }
    }
}

impl fmt::Display for ToolchainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cmake())
    }
}

/// Ordered variable set; the first insertion of a name fixes its position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolchainVariables {
    vars: Vec<(String, ToolchainValue)>,
}

impl ToolchainVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing the value in place if it already exists
    pub fn set(&mut self, name: impl Into<String>, value: ToolchainValue) {
        let name = name.into();
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.vars.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolchainValue> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ToolchainValue)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.vars.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Render as a CMake toolchain script
    pub fn to_cmake_script(&self) -> String {
        let mut script = String::from("# Generated by up-kitchen. Do not edit.\n");
        for (name, value) in &self.vars {
            script.push_str(&format!(
                "set({} \"{}\" CACHE {} \"\" FORCE)\n",
                name,
                escape_cmake(&value.to_cmake()),
                value.cmake_cache_type()
            ));
        }
        script
    }
}

fn escape_cmake(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Generate the variable set for the build configuration step
///
/// `shared`, `build_testing` and `build_unbundled` must be present in the
/// active option set. `CMAKE_POSITION_INDEPENDENT_CODE` is only emitted when
/// `fPIC` survived the defaulting rules, and the MSVC runtime flag only for
/// MSVC-family compilers.
pub fn generate_toolchain(
    settings: &Settings,
    options: &OptionSet,
    recipe_layout: &LayoutSection,
    layout: &Layout,
) -> Result<ToolchainVariables> {
    let mut vars = ToolchainVariables::new();

    vars.set("PROTO_PATH", ToolchainValue::Str(recipe_layout.proto_path()));
    vars.set(
        "BUILD_TESTING",
        ToolchainValue::Bool(options.require_bool(OptionName::BuildTesting)?),
    );
    vars.set(
        "BUILD_UNBUNDLED",
        ToolchainValue::Bool(options.require_bool(OptionName::BuildUnbundled)?),
    );
    vars.set(
        "BUILD_SHARED_LIBS",
        ToolchainValue::Bool(options.require_bool(OptionName::Shared)?),
    );

    if let Some(fpic) = options.get_bool(OptionName::Fpic) {
        vars.set("CMAKE_POSITION_INDEPENDENT_CODE", ToolchainValue::Bool(fpic));
    }

    vars.set(
        "CMAKE_BUILD_TYPE",
        ToolchainValue::Str(settings.build_type.to_string()),
    );
    vars.set(
        "CMAKE_INSTALL_PREFIX",
        ToolchainValue::Path(layout.install_dir.clone()),
    );

    if settings.compiler.kind.is_msvc() {
        vars.set(
            "USE_MSVC_RUNTIME_LIBRARY_DLL",
            ToolchainValue::Bool(!settings.compiler.is_static_runtime()),
        );
    }

    Ok(vars)
}
