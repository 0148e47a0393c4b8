// src/recipe/requirements.rs

//! Projection of option state into external package requirements
//!
//! The projection is a pure function of the option set and the recipe's
//! pins: the same inputs always produce the same ordered list, which the
//! external build tool relies on for caching.

use crate::recipe::options::{OptionName, OptionSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pinned versions of the external packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyPins {
    #[serde(default = "default_protobuf")]
    pub protobuf: String,
    #[serde(default = "default_spdlog")]
    pub spdlog: String,
    #[serde(default = "default_gtest")]
    pub gtest: String,
}

fn default_protobuf() -> String {
    "3.21.12".to_string()
}

fn default_spdlog() -> String {
    "1.13.0".to_string()
}

fn default_gtest() -> String {
    "1.14.0".to_string()
}

impl Default for DependencyPins {
    fn default() -> Self {
        Self {
            protobuf: default_protobuf(),
            spdlog: default_spdlog(),
            gtest: default_gtest(),
        }
    }
}

/// Build variant of a required package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "channel", rename_all = "snake_case")]
pub enum RequirementVariant {
    /// The package's regular build
    Default,
    /// The same package and version published on a cross-compiling channel
    CrossCompileChannel(String),
}

/// One external package pin
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Requirement {
    pub name: String,
    pub version: String,
    pub variant: RequirementVariant,
    /// Option that pulled this requirement in, if it is conditional
    pub activated_by: Option<OptionName>,
}

impl Requirement {
    fn always(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            variant: RequirementVariant::Default,
            activated_by: None,
        }
    }

    /// Concrete reference handed to the build tool: `name/version[@user/channel]`
    pub fn reference(&self) -> String {
        match &self.variant {
            RequirementVariant::Default => format!("{}/{}", self.name, self.version),
            RequirementVariant::CrossCompileChannel(channel) => {
                format!("{}/{}@{}", self.name, self.version, channel)
            }
        }
    }

    /// Whether consumers always see this package in the link requirements
    pub fn is_always_required(&self) -> bool {
        self.activated_by.is_none()
    }

    /// Consumer-facing component name, `name::name`
    pub fn component(&self) -> String {
        format!("{}::{}", self.name, self.name)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())
    }
}

/// Project the ordered requirement list for an option set
///
/// - protobuf and spdlog are always required;
/// - protobuf moves to `cross_channel` when `build_cross_compiling` is on;
/// - gtest is added only when `build_testing` is on.
pub fn project_requirements(
    pins: &DependencyPins,
    options: &OptionSet,
    cross_channel: Option<&str>,
) -> Vec<Requirement> {
    let mut protobuf = Requirement::always("protobuf", &pins.protobuf);
    if options.get_bool(OptionName::BuildCrossCompiling) == Some(true)
        && let Some(channel) = cross_channel
    {
        protobuf.variant = RequirementVariant::CrossCompileChannel(channel.to_string());
    }

    let mut requirements = vec![protobuf, Requirement::always("spdlog", &pins.spdlog)];

    if options.get_bool(OptionName::BuildTesting) == Some(true) {
        requirements.push(Requirement {
            activated_by: Some(OptionName::BuildTesting),
            ..Requirement::always("gtest", &pins.gtest)
        });
    }

    requirements
}
