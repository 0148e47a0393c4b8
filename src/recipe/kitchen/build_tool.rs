// src/recipe/kitchen/build_tool.rs

//! External build tool capability
//!
//! Configure, build and install are delegated to a native build system.
//! Failures are passed through as `BuildToolError` carrying the tool's exit
//! status and its own output; nothing is reinterpreted.

use crate::error::{Error, Result};
use crate::recipe::settings::BuildType;
use crate::recipe::toolchain::ToolchainVariables;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Capability for driving the native build
pub trait BuildTool {
    /// Configure `build_dir` from `source_dir` using the generated toolchain file
    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        toolchain_file: &Path,
        vars: &ToolchainVariables,
    ) -> Result<()>;

    fn build(&self, build_dir: &Path, build_type: BuildType, jobs: usize) -> Result<()>;

    fn install(&self, build_dir: &Path, build_type: BuildType, prefix: &Path) -> Result<()>;
}

/// CMake-backed build tool
#[derive(Debug, Clone, Default)]
pub struct CMake {
    /// Explicit program path; looked up on PATH when unset
    program: Option<PathBuf>,
}

impl CMake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    fn program(&self, step: &str) -> Result<PathBuf> {
        match &self.program {
            Some(p) => Ok(p.clone()),
            None => which::which("cmake").map_err(|e| Error::BuildToolError {
                step: step.to_string(),
                status: "not found".to_string(),
                diagnostic: format!("cmake not found on PATH: {}", e),
            }),
        }
    }

    fn run(&self, step: &str, args: Vec<String>) -> Result<()> {
        let program = self.program(step)?;
        debug!("Running {} {}", program.display(), args.join(" "));

        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|e| Error::BuildToolError {
                step: step.to_string(),
                status: "failed to start".to_string(),
                diagnostic: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{} stdout:\n{}", step, stdout.trim_end());
        }

        if !output.status.success() {
            return Err(Error::BuildToolError {
                step: step.to_string(),
                status: output.status.to_string(),
                diagnostic: format!("{}{}", stdout, String::from_utf8_lossy(&output.stderr)),
            });
        }
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl BuildTool for CMake {
    fn configure(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        toolchain_file: &Path,
        vars: &ToolchainVariables,
    ) -> Result<()> {
        debug!("Configuring with {} toolchain variables", vars.len());
        let args = vec![
            "-S".to_string(),
            path_arg(source_dir),
            "-B".to_string(),
            path_arg(build_dir),
            format!("-DCMAKE_TOOLCHAIN_FILE={}", path_arg(toolchain_file)),
        ];
        self.run("configure", args)
    }

    fn build(&self, build_dir: &Path, build_type: BuildType, jobs: usize) -> Result<()> {
        let args = vec![
            "--build".to_string(),
            path_arg(build_dir),
            "--config".to_string(),
            build_type.to_string(),
            "--parallel".to_string(),
            jobs.max(1).to_string(),
        ];
        self.run("build", args)
    }

    fn install(&self, build_dir: &Path, build_type: BuildType, prefix: &Path) -> Result<()> {
        let args = vec![
            "--install".to_string(),
            path_arg(build_dir),
            "--config".to_string(),
            build_type.to_string(),
            "--prefix".to_string(),
            path_arg(prefix),
        ];
        self.run("install", args)
    }
}
