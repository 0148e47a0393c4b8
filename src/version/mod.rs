// src/version/mod.rs

//! Version handling for compilers and the recipe engine itself
//!
//! Compiler versions are dotted numeric strings of varying depth ("11",
//! "13.0.1", "191", "19.29.30133"), so they are compared component by
//! component with missing components treated as zero. Plain string ordering
//! would put "9" above "11".

use crate::error::{Error, Result};
use semver::{Version, VersionReq};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A dotted numeric version such as a compiler version
#[derive(Debug, Clone, Eq)]
pub struct DottedVersion {
    components: Vec<u64>,
    original: String,
}

impl DottedVersion {
    /// Parse a dotted version string
    ///
    /// Leading numeric components are kept; parsing stops at the first
    /// component that does not start with a digit, and any non-digit tail of a
    /// component is ignored ("11.4.0-ubuntu1" compares as 11.4.0).
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let mut components = Vec::new();

        for part in trimmed.split('.') {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                break;
            }
            let value = digits.parse::<u64>().map_err(|e| {
                Error::ParseError(format!("Invalid version component in '{}': {}", s, e))
            })?;
            components.push(value);
            if digits.len() != part.len() {
                break;
            }
        }

        if components.is_empty() {
            return Err(Error::ParseError(format!(
                "Version '{}' has no numeric component",
                s
            )));
        }

        Ok(Self {
            components,
            original: trimmed.to_string(),
        })
    }

    /// Single-component version such as "11"
    pub fn from_major(major: u64) -> Self {
        Self {
            components: vec![major],
            original: major.to_string(),
        }
    }

    /// Numeric components, most significant first
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Major component
    pub fn major(&self) -> u64 {
        self.components[0]
    }

    fn compare(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl FromStr for DottedVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for DottedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Version of this engine, used against a recipe's `required_version`
pub fn engine_version() -> Version {
    Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| Version::new(0, 0, 0))
}

/// Check that `version` satisfies a semver requirement string like ">=0.1.0"
pub fn check_required_version(requirement: &str, version: &Version) -> Result<()> {
    let req = VersionReq::parse(requirement).map_err(|e| {
        Error::ParseError(format!("Invalid version requirement '{}': {}", requirement, e))
    })?;

    if !req.matches(version) {
        return Err(Error::ConfigurationError(format!(
            "Recipe requires engine version {}, running {}",
            requirement, version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> DottedVersion {
        DottedVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(v("11").components(), &[11]);
        assert_eq!(v("13.0.1").components(), &[13, 0, 1]);
        assert_eq!(v("11.4.0-ubuntu1").components(), &[11, 4, 0]);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(DottedVersion::parse("").is_err());
        assert!(DottedVersion::parse("latest").is_err());
    }

    #[test]
    fn test_numeric_not_lexical_ordering() {
        assert!(v("9") < v("11"));
        assert!(v("191") > v("19"));
        assert!(v("13.10") > v("13.9"));
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(v("11"), v("11.0.0"));
        assert!(v("13") < v("13.0.1"));
    }

    #[test]
    fn test_required_version() {
        let running = Version::new(0, 2, 0);
        assert!(check_required_version(">=0.1.0", &running).is_ok());

        let err = check_required_version(">=1.59.0", &running).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));

        assert!(matches!(
            check_required_version("not a requirement", &running),
            Err(Error::ParseError(_))
        ));
    }
}
