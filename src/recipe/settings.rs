// src/recipe/settings.rs

//! Target settings: operating system, architecture, compiler and build type
//!
//! Settings come from host detection, an optional profile file, and
//! `key=value` overrides, applied in that order. Keys follow the familiar
//! dotted form: `os`, `arch`, `build_type`, `compiler`, `compiler.version`,
//! `compiler.cppstd`, `compiler.runtime`.

use crate::error::{Error, Result};
use crate::recipe::options::OptionValue;
use crate::version::DottedVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use tracing::debug;

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
pub enum Os {
    Linux,
    FreeBSD,
    Windows,
    WindowsStore,
    Macos,
    #[strum(serialize = "iOS")]
    Ios,
    Android,
}

impl Os {
    /// Windows-family targets, where position-independent code is meaningless
    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows | Self::WindowsStore)
    }

    /// Targets that link `m`, `pthread` and `dl` as separate system libraries
    pub fn needs_posix_system_libs(&self) -> bool {
        matches!(self, Self::Linux | Self::FreeBSD)
    }

    /// The operating system this binary was compiled for
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "macos" => Self::Macos,
            "ios" => Self::Ios,
            "freebsd" => Self::FreeBSD,
            "android" => Self::Android,
            _ => Self::Linux,
        }
    }
}

/// CMake build configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
pub enum BuildType {
    #[default]
    Release,
    Debug,
    RelWithDebInfo,
    MinSizeRel,
}

/// Compiler family
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CompilerKind {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
    VisualStudio,
    Other(String),
}

impl CompilerKind {
    /// Settings name of this compiler ("gcc", "apple-clang", "Visual Studio", ...)
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gcc => "gcc",
            Self::Clang => "clang",
            Self::AppleClang => "apple-clang",
            Self::Msvc => "msvc",
            Self::VisualStudio => "Visual Studio",
            Self::Other(name) => name,
        }
    }

    /// MSVC-family compilers
    pub fn is_msvc(&self) -> bool {
        matches!(self, Self::Msvc | Self::VisualStudio)
    }
}

impl fmt::Display for CompilerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompilerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.trim() {
            "" => return Err(Error::ParseError("Empty compiler name".to_string())),
            "gcc" => Self::Gcc,
            "clang" => Self::Clang,
            "apple-clang" => Self::AppleClang,
            "msvc" => Self::Msvc,
            "Visual Studio" => Self::VisualStudio,
            other => Self::Other(other.to_string()),
        };
        Ok(kind)
    }
}

/// MSVC runtime linkage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuntimeLinkage {
    Static,
    Dynamic,
}

impl FromStr for RuntimeLinkage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "static" | "MT" | "MTd" => Ok(Self::Static),
            "dynamic" | "MD" | "MDd" => Ok(Self::Dynamic),
            other => Err(Error::ParseError(format!(
                "Unknown compiler.runtime '{}' (expected static, dynamic, MT, MTd, MD, MDd)",
                other
            ))),
        }
    }
}

/// A C++ standard setting such as "14" or "gnu17"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CppStd {
    /// Two-digit standard ("98", "11", "14", ...)
    pub year: u16,
    /// GNU extensions enabled
    pub gnu: bool,
}

impl CppStd {
    /// Ordering key; C++98 sorts before C++11
    pub fn level(&self) -> u16 {
        if self.year >= 98 {
            1900 + self.year
        } else {
            2000 + self.year
        }
    }

    /// Whether this standard is at least `min` (given as 98, 11, 14, ...)
    pub fn at_least(&self, min: u16) -> bool {
        let floor = CppStd {
            year: min,
            gnu: false,
        };
        self.level() >= floor.level()
    }
}

impl FromStr for CppStd {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let (gnu, digits) = match trimmed.strip_prefix("gnu") {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let year = digits
            .parse::<u16>()
            .map_err(|_| Error::ParseError(format!("Invalid compiler.cppstd '{}'", s)))?;
        Ok(Self { year, gnu })
    }
}

impl fmt::Display for CppStd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gnu {
            write!(f, "gnu{:02}", self.year)
        } else {
            write!(f, "{:02}", self.year)
        }
    }
}

/// Compiler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerSettings {
    pub kind: CompilerKind,
    #[serde(serialize_with = "serialize_display")]
    pub version: DottedVersion,
    pub cppstd: Option<CppStd>,
    pub runtime: Option<RuntimeLinkage>,
}

impl CompilerSettings {
    /// Static runtime linking was requested
    pub fn is_static_runtime(&self) -> bool {
        self.runtime == Some(RuntimeLinkage::Static)
    }
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// All settings that shape a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub os: Os,
    pub arch: String,
    pub build_type: BuildType,
    pub compiler: CompilerSettings,
}

impl Default for Settings {
    /// Linux x86_64 Release with gcc 11, no cppstd or runtime
    fn default() -> Self {
        Self {
            os: Os::Linux,
            arch: "x86_64".to_string(),
            build_type: BuildType::Release,
            compiler: CompilerSettings {
                kind: CompilerKind::Gcc,
                version: DottedVersion::from_major(11),
                cppstd: None,
                runtime: None,
            },
        }
    }
}

impl Settings {
    /// Settings for the machine running the engine
    ///
    /// The compiler is probed from PATH (gcc, then clang). On Windows the
    /// compiler cannot be probed and must be given explicitly.
    pub fn detect() -> Self {
        let mut settings = Self {
            os: Os::host(),
            arch: std::env::consts::ARCH.to_string(),
            ..Self::default()
        };

        if let Some(compiler) = detect_compiler() {
            debug!(
                "Detected compiler {} {}",
                compiler.kind, compiler.version
            );
            settings.compiler = compiler;
        }

        settings
    }

    /// Apply one `key=value` setting
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key.trim() {
            "os" => {
                self.os = value
                    .trim()
                    .parse()
                    .map_err(|_| Error::ParseError(format!("Unknown os '{}'", value)))?;
            }
            "arch" => self.arch = value.trim().to_string(),
            "build_type" => {
                self.build_type = value
                    .trim()
                    .parse()
                    .map_err(|_| Error::ParseError(format!("Unknown build_type '{}'", value)))?;
            }
            "compiler" => self.compiler.kind = value.parse()?,
            "compiler.version" => self.compiler.version = DottedVersion::parse(value)?,
            "compiler.cppstd" => self.compiler.cppstd = Some(value.parse()?),
            "compiler.runtime" => self.compiler.runtime = Some(value.parse()?),
            other => {
                return Err(Error::ParseError(format!("Unknown setting '{}'", other)));
            }
        }
        Ok(())
    }

    /// Apply repeated `key=value` arguments
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::ParseError(format!("Setting '{}' must be in key=value form", arg))
            })?;
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Apply a profile's settings table
    pub fn apply_profile(&mut self, profile: &Profile) -> Result<()> {
        // compiler first so that compiler.* keys land on the right compiler
        if let Some(kind) = profile.settings.get("compiler") {
            self.set("compiler", kind)?;
        }
        for (key, value) in &profile.settings {
            if key != "compiler" {
                self.set(key, value)?;
            }
        }
        Ok(())
    }
}

/// Probe PATH for a C++ compiler
fn detect_compiler() -> Option<CompilerSettings> {
    for (program, kind) in [("gcc", CompilerKind::Gcc), ("clang", CompilerKind::Clang)] {
        let Ok(path) = which::which(program) else {
            continue;
        };
        let Ok(output) = Command::new(&path).arg("-dumpversion").output() else {
            continue;
        };
        if !output.status.success() {
            continue;
        }
        let raw = String::from_utf8_lossy(&output.stdout);
        if let Ok(version) = DottedVersion::parse(raw.trim()) {
            return Some(CompilerSettings {
                kind,
                version,
                cppstd: None,
                runtime: None,
            });
        }
    }
    None
}

/// A profile file
///
/// ```toml
/// [settings]
/// os = "Linux"
/// compiler = "gcc"
/// "compiler.version" = "12"
///
/// [options]
/// shared = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

impl Profile {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid profile: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_settings() {
        let mut settings = Settings::default();
        settings
            .apply_args(&[
                "os=Windows".to_string(),
                "compiler=msvc".to_string(),
                "compiler.version=193".to_string(),
                "compiler.runtime=static".to_string(),
                "build_type=Debug".to_string(),
            ])
            .unwrap();

        assert_eq!(settings.os, Os::Windows);
        assert!(settings.compiler.kind.is_msvc());
        assert_eq!(settings.compiler.version, DottedVersion::parse("193").unwrap());
        assert!(settings.compiler.is_static_runtime());
        assert_eq!(settings.build_type, BuildType::Debug);
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let mut settings = Settings::default();
        assert!(settings.set("compiler.libcxx", "libstdc++11").is_err());
        assert!(settings.set("os", "Plan9").is_err());
        assert!(settings.apply_args(&["os".to_string()]).is_err());
    }

    #[test]
    fn test_compiler_kind_round_trip_names() {
        assert_eq!("Visual Studio".parse::<CompilerKind>().unwrap(), CompilerKind::VisualStudio);
        assert_eq!("apple-clang".parse::<CompilerKind>().unwrap().as_str(), "apple-clang");
        assert_eq!(
            "intel-cc".parse::<CompilerKind>().unwrap(),
            CompilerKind::Other("intel-cc".to_string())
        );
    }

    #[test]
    fn test_runtime_spellings() {
        assert_eq!("MT".parse::<RuntimeLinkage>().unwrap(), RuntimeLinkage::Static);
        assert_eq!("MDd".parse::<RuntimeLinkage>().unwrap(), RuntimeLinkage::Dynamic);
        assert!("shared".parse::<RuntimeLinkage>().is_err());
    }

    #[test]
    fn test_cppstd_ordering() {
        let cpp98: CppStd = "98".parse().unwrap();
        let gnu11: CppStd = "gnu11".parse().unwrap();
        let cpp17: CppStd = "17".parse().unwrap();

        assert!(gnu11.gnu);
        assert!(!cpp98.at_least(11));
        assert!(!gnu11.at_least(14));
        assert!(cpp17.at_least(14));
        assert!(cpp17.at_least(17));
        assert_eq!(gnu11.to_string(), "gnu11");
    }

    #[test]
    fn test_windows_family() {
        assert!(Os::Windows.is_windows());
        assert!(Os::WindowsStore.is_windows());
        assert!(!Os::Linux.is_windows());
        assert!(Os::FreeBSD.needs_posix_system_libs());
        assert!(!Os::Macos.needs_posix_system_libs());
    }

    #[test]
    fn test_profile_applies_compiler_first() {
        let profile = Profile::parse(
            r#"
[settings]
"compiler.version" = "15"
compiler = "clang"
os = "Macos"

[options]
shared = true
"#,
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.apply_profile(&profile).unwrap();
        assert_eq!(settings.compiler.kind, CompilerKind::Clang);
        assert_eq!(settings.compiler.version, DottedVersion::parse("15").unwrap());
        assert_eq!(settings.os, Os::Macos);
        assert_eq!(profile.options.get("shared"), Some(&OptionValue::Bool(true)));
    }
}
