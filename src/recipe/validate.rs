// src/recipe/validate.rs

//! Toolchain and platform compatibility checks
//!
//! Runs on the final option set, strictly before any network or filesystem
//! action. Every rejection is a [`Error::ConfigurationError`].

use crate::error::{Error, Result};
use crate::recipe::format::ValidationSection;
use crate::recipe::options::{OptionName, OptionSet};
use crate::recipe::settings::Settings;
use crate::version::DottedVersion;
use tracing::{debug, warn};

/// Reject unsupported compiler, standard and option combinations
///
/// Checks, in order:
/// 1. an explicit `compiler.cppstd` below the recipe minimum;
/// 2. a compiler version below its table entry (compilers missing from the
///    table are not checked);
/// 3. shared linkage on an MSVC-family compiler, regardless of version.
pub fn validate_configuration(
    package: &str,
    rules: &ValidationSection,
    settings: &Settings,
    options: &OptionSet,
) -> Result<()> {
    let compiler = &settings.compiler;

    if let Some(cppstd) = compiler.cppstd
        && !cppstd.at_least(rules.min_cppstd)
    {
        return Err(Error::ConfigurationError(format!(
            "{} requires C++{}, but compiler.cppstd is {}",
            package, rules.min_cppstd, cppstd
        )));
    }

    match rules.compilers.get(compiler.kind.as_str()) {
        Some(minimum) => {
            let minimum = DottedVersion::parse(minimum)?;
            if compiler.version < minimum {
                return Err(Error::ConfigurationError(format!(
                    "{} requires C++{}, which your compiler does not support \
                     ({} {} < {})",
                    package, rules.min_cppstd, compiler.kind, compiler.version, minimum
                )));
            }
            debug!(
                "Compiler {} {} satisfies minimum {}",
                compiler.kind, compiler.version, minimum
            );
        }
        None => {
            warn!(
                "No minimum version known for compiler '{}', assuming C++{} support",
                compiler.kind, rules.min_cppstd
            );
        }
    }

    if compiler.kind.is_msvc() && options.get_bool(OptionName::Shared) == Some(true) {
        return Err(Error::ConfigurationError(format!(
            "{} can not be built as shared on Visual Studio and msvc.",
            package
        )));
    }

    Ok(())
}
