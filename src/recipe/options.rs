// src/recipe/options.rs

//! Recipe options and their platform defaulting rules
//!
//! Options are declared once per recipe, overridden by the user, and then run
//! through an ordered list of [`OptionRule`]s that may remove options from the
//! active set. A removed option is *absent*, which later phases must not
//! confuse with `false`: `fPIC` removed on Windows emits no PIC variable at
//! all, while `fPIC=False` emits `OFF`.
//!
//! Every step returns a new [`OptionSet`]; nothing mutates options in place.

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use crate::recipe::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::debug;

/// Names of the options this recipe understands
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum OptionName {
    #[strum(serialize = "shared")]
    #[serde(rename = "shared")]
    Shared,
    #[strum(serialize = "fPIC")]
    #[serde(rename = "fPIC")]
    Fpic,
    #[strum(serialize = "build_testing")]
    #[serde(rename = "build_testing")]
    BuildTesting,
    /// Use system-provided dependencies instead of the bundled ones
    #[strum(serialize = "build_unbundled")]
    #[serde(rename = "build_unbundled")]
    BuildUnbundled,
    /// Only declared by recipe variants that carry a cross channel
    #[strum(serialize = "build_cross_compiling")]
    #[serde(rename = "build_cross_compiling")]
    BuildCrossCompiling,
}

/// An option value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Choice(String),
}

impl OptionValue {
    /// Parse a user-supplied value; boolean spellings become [`OptionValue::Bool`]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Self::Bool(true),
            "false" | "off" | "no" | "0" => Self::Bool(false),
            _ => Self::Choice(s.trim().to_string()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Choice(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Choice(s) => write!(f, "{}", s),
        }
    }
}

/// Values an option accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedValues {
    Boolean,
    OneOf(Vec<String>),
}

impl AllowedValues {
    fn accepts(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (Self::Boolean, OptionValue::Bool(_)) => true,
            (Self::OneOf(choices), OptionValue::Choice(c)) => choices.iter().any(|x| x == c),
            _ => false,
        }
    }
}

impl fmt::Display for AllowedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "[True, False]"),
            Self::OneOf(choices) => write!(f, "[{}]", choices.join(", ")),
        }
    }
}

/// Declaration of one option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
    pub name: OptionName,
    pub allowed: AllowedValues,
    pub default: OptionValue,
}

/// The options a recipe declares, with their defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSchema {
    decls: Vec<OptionDecl>,
}

impl OptionSchema {
    /// Build the schema for a recipe
    ///
    /// All options default to false. `build_cross_compiling` is only declared
    /// when the recipe names a cross channel. Recipe-level defaults must refer
    /// to declared options and carry allowed values.
    pub fn for_recipe(recipe: &Recipe) -> Result<Self> {
        let mut decls: Vec<OptionDecl> = OptionName::iter()
            .filter(|name| {
                *name != OptionName::BuildCrossCompiling || recipe.supports_cross_compiling()
            })
            .map(|name| OptionDecl {
                name,
                allowed: AllowedValues::Boolean,
                default: OptionValue::Bool(false),
            })
            .collect();

        for (key, value) in &recipe.options {
            let decl = find_decl_mut(&mut decls, key)?;
            if !decl.allowed.accepts(value) {
                return Err(Error::ParseError(format!(
                    "Invalid default '{}' for option '{}', allowed: {}",
                    value, key, decl.allowed
                )));
            }
            decl.default = value.clone();
        }

        Ok(Self { decls })
    }

    /// Declared options, in declaration order
    pub fn decls(&self) -> &[OptionDecl] {
        &self.decls
    }

    pub fn is_declared(&self, name: OptionName) -> bool {
        self.decls.iter().any(|d| d.name == name)
    }

    /// Option set holding every declared option at its default
    pub fn defaults(&self) -> OptionSet {
        OptionSet {
            values: self
                .decls
                .iter()
                .map(|d| (d.name, d.default.clone()))
                .collect(),
        }
    }

    /// Apply user overrides on top of the defaults
    ///
    /// Unknown option names and disallowed values fail fast.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, OptionValue>) -> Result<OptionSet> {
        let mut values = self.defaults().values;

        for (key, value) in overrides {
            let decl = self
                .decls
                .iter()
                .find(|d| d.name.as_ref() == key.as_str())
                .ok_or_else(|| unknown_option(key, &self.decls))?;

            if !decl.allowed.accepts(value) {
                return Err(Error::ParseError(format!(
                    "Invalid value '{}' for option '{}', allowed: {}",
                    value, key, decl.allowed
                )));
            }
            values.insert(decl.name, value.clone());
        }

        Ok(OptionSet { values })
    }
}

fn find_decl_mut<'a>(decls: &'a mut [OptionDecl], key: &str) -> Result<&'a mut OptionDecl> {
    match decls.iter().position(|d| d.name.as_ref() == key) {
        Some(i) => Ok(&mut decls[i]),
        None => Err(unknown_option(key, decls)),
    }
}

fn unknown_option(key: &str, decls: &[OptionDecl]) -> Error {
    let known: Vec<String> = decls.iter().map(|d| d.name.to_string()).collect();
    Error::ParseError(format!(
        "Unknown option '{}' (declared: {})",
        key,
        known.join(", ")
    ))
}

/// An immutable set of active option values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct OptionSet {
    values: BTreeMap<OptionName, OptionValue>,
}

impl OptionSet {
    /// Value of an option, or `None` when it is absent from the active set
    pub fn get(&self, name: OptionName) -> Option<&OptionValue> {
        self.values.get(&name)
    }

    pub fn contains(&self, name: OptionName) -> bool {
        self.values.contains_key(&name)
    }

    /// Boolean value of an option, or `None` when absent
    pub fn get_bool(&self, name: OptionName) -> Option<bool> {
        self.get(name).and_then(OptionValue::as_bool)
    }

    /// Boolean value of an option that a phase cannot run without
    pub fn require_bool(&self, name: OptionName) -> Result<bool> {
        match self.get(name) {
            Some(OptionValue::Bool(b)) => Ok(*b),
            Some(other) => Err(Error::ConfigurationError(format!(
                "Option '{}' is '{}', expected a boolean",
                name, other
            ))),
            None => Err(Error::ConfigurationError(format!(
                "Option '{}' has no value in the active option set",
                name
            ))),
        }
    }

    /// New set without `name`
    pub fn without(&self, name: OptionName) -> Self {
        let mut values = self.values.clone();
        values.remove(&name);
        Self { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionName, &OptionValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A deterministic rule that derives a new option set from the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionRule {
    /// Remove `option` on Windows-family targets
    RemoveOnWindows(OptionName),
    /// Remove `removed` whenever `trigger` is enabled, on every platform
    RemoveWhenEnabled {
        trigger: OptionName,
        removed: OptionName,
    },
}

/// Defaulting rules, applied in this order
pub const DEFAULTING_RULES: [OptionRule; 2] = [
    OptionRule::RemoveOnWindows(OptionName::Fpic),
    OptionRule::RemoveWhenEnabled {
        trigger: OptionName::Shared,
        removed: OptionName::Fpic,
    },
];

impl OptionRule {
    /// Apply the rule, producing a new option set
    pub fn apply(&self, options: &OptionSet, settings: &Settings) -> OptionSet {
        match *self {
            Self::RemoveOnWindows(option) => {
                if settings.os.is_windows() && options.contains(option) {
                    debug!("Removing option '{}' on {}", option, settings.os);
                    options.without(option)
                } else {
                    options.clone()
                }
            }
            Self::RemoveWhenEnabled { trigger, removed } => {
                if options.get_bool(trigger) == Some(true) && options.contains(removed) {
                    debug!("Removing option '{}' because '{}' is enabled", removed, trigger);
                    options.without(removed)
                } else {
                    options.clone()
                }
            }
        }
    }
}

/// Resolve the active option set for a recipe
///
/// Defaults, then user overrides, then [`DEFAULTING_RULES`] in order.
/// Cannot fail once the overrides are valid.
pub fn resolve_options(
    schema: &OptionSchema,
    overrides: &BTreeMap<String, OptionValue>,
    settings: &Settings,
) -> Result<OptionSet> {
    let initial = schema.with_overrides(overrides)?;
    Ok(apply_rules(&initial, settings))
}

/// Run every defaulting rule over an option set
pub fn apply_rules(options: &OptionSet, settings: &Settings) -> OptionSet {
    DEFAULTING_RULES
        .iter()
        .fold(options.clone(), |acc, rule| rule.apply(&acc, settings))
}

/// Parse repeated `name=value` option arguments
pub fn parse_option_overrides(args: &[String]) -> Result<BTreeMap<String, OptionValue>> {
    let mut overrides = BTreeMap::new();
    for arg in args {
        let (key, value) = arg.split_once('=').ok_or_else(|| {
            Error::ParseError(format!("Option '{}' must be in name=value form", arg))
        })?;
        overrides.insert(key.trim().to_string(), OptionValue::parse(value));
    }
    Ok(overrides)
}

impl FromStr for OptionValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::parse(s))
    }
}
