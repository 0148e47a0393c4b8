// src/recipe/kitchen/cook.rs

//! Cook: build and package stages for one acquired source tree
//!
//! Stages run in a fixed order with no branches:
//!
//! ```text
//! Unconfigured -> Patched -> Configured -> Built -> Installed -> Cleaned -> Packaged
//! ```
//!
//! Entering a stage out of order is an error, and any failure leaves the cook
//! at the last completed stage.

use crate::error::{Error, Result};
use crate::recipe::format::{PatchInfo, Recipe};
use crate::recipe::kitchen::archive::apply_patch;
use crate::recipe::kitchen::build_tool::BuildTool;
use crate::recipe::kitchen::hygiene::prune_install_tree;
use crate::recipe::layout::Layout;
use crate::recipe::settings::Settings;
use crate::recipe::toolchain::ToolchainVariables;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::info;

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CookStage {
    Unconfigured,
    Patched,
    Configured,
    Built,
    Installed,
    Cleaned,
    Packaged,
}

impl CookStage {
    /// The only stage reachable from this one
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unconfigured => Some(Self::Patched),
            Self::Patched => Some(Self::Configured),
            Self::Configured => Some(Self::Built),
            Self::Built => Some(Self::Installed),
            Self::Installed => Some(Self::Cleaned),
            Self::Cleaned => Some(Self::Packaged),
            Self::Packaged => None,
        }
    }
}

impl fmt::Display for CookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single cook operation
pub struct Cook<'a> {
    recipe: &'a Recipe,
    settings: &'a Settings,
    layout: &'a Layout,
    toolchain: &'a ToolchainVariables,
    patches: &'a [PatchInfo],
    build_tool: &'a dyn BuildTool,
    jobs: usize,
    stage: CookStage,
    removed: Vec<PathBuf>,
    log: String,
}

impl<'a> Cook<'a> {
    pub fn new(
        recipe: &'a Recipe,
        settings: &'a Settings,
        layout: &'a Layout,
        toolchain: &'a ToolchainVariables,
        patches: &'a [PatchInfo],
        build_tool: &'a dyn BuildTool,
        jobs: usize,
    ) -> Self {
        Self {
            recipe,
            settings,
            layout,
            toolchain,
            patches,
            build_tool,
            jobs,
            stage: CookStage::Unconfigured,
            removed: Vec::new(),
            log: String::new(),
        }
    }

    pub fn stage(&self) -> CookStage {
        self.stage
    }

    /// Paths removed from the install tree by the cleanup stage
    pub fn removed(&self) -> &[PathBuf] {
        &self.removed
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    /// Run every remaining stage in order
    pub fn run(&mut self) -> Result<()> {
        let steps: [fn(&mut Self) -> Result<()>; 6] = [
            Self::patch,
            Self::configure,
            Self::build,
            Self::install,
            Self::clean,
            Self::package,
        ];
        // Step i enters the stage after the i-th one
        for step in steps.iter().skip(self.stage as usize) {
            step(self)?;
        }
        Ok(())
    }

    /// Apply the version's patches in declaration order
    pub fn patch(&mut self) -> Result<()> {
        self.expect_next(CookStage::Patched)?;

        for patch_info in self.patches {
            let patch_path = self.recipe.patch_path(patch_info);
            if !patch_path.is_file() {
                return Err(Error::PatchError {
                    patch: patch_info.patch_file.clone(),
                    reason: format!("Patch file not found: {}", patch_path.display()),
                });
            }

            match &patch_info.patch_description {
                Some(desc) => info!("Applying patch {}: {}", patch_info.patch_file, desc),
                None => info!("Applying patch {}", patch_info.patch_file),
            }
            apply_patch(&self.layout.source_dir, &patch_path, patch_info.strip)?;
            self.log_line(&format!("Applied patch: {}", patch_info.patch_file));
        }

        self.finish(CookStage::Patched);
        Ok(())
    }

    /// Write the toolchain file and configure the build tree
    pub fn configure(&mut self) -> Result<()> {
        self.expect_next(CookStage::Configured)?;

        fs::create_dir_all(&self.layout.build_dir)?;
        let toolchain_file = self.layout.toolchain_file();
        fs::write(&toolchain_file, self.toolchain.to_cmake_script())?;
        self.log_line(&format!("Wrote toolchain: {}", toolchain_file.display()));

        self.build_tool.configure(
            &self.layout.source_dir,
            &self.layout.build_dir,
            &toolchain_file,
            self.toolchain,
        )?;

        self.finish(CookStage::Configured);
        Ok(())
    }

    pub fn build(&mut self) -> Result<()> {
        self.expect_next(CookStage::Built)?;
        self.build_tool
            .build(&self.layout.build_dir, self.settings.build_type, self.jobs)?;
        self.finish(CookStage::Built);
        Ok(())
    }

    pub fn install(&mut self) -> Result<()> {
        self.expect_next(CookStage::Installed)?;
        // The package is exactly what this install produced
        if self.layout.install_dir.exists() {
            fs::remove_dir_all(&self.layout.install_dir)?;
        }
        self.build_tool.install(
            &self.layout.build_dir,
            self.settings.build_type,
            &self.layout.install_dir,
        )?;
        self.finish(CookStage::Installed);
        Ok(())
    }

    /// Strip generator metadata and byproducts from the install tree
    pub fn clean(&mut self) -> Result<()> {
        self.expect_next(CookStage::Cleaned)?;
        self.removed = prune_install_tree(&self.layout.install_dir)?;
        for path in self.removed.clone() {
            self.log_line(&format!("Removed: {}", path.display()));
        }
        self.finish(CookStage::Cleaned);
        Ok(())
    }

    /// Copy the license file into the package
    pub fn package(&mut self) -> Result<()> {
        self.expect_next(CookStage::Packaged)?;

        let license_name = &self.recipe.package.license_file;
        let license = self.layout.source_dir.join(license_name);
        if !license.is_file() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("License file not found: {}", license.display()),
            )));
        }

        let licenses_dir = self.layout.licenses_dir();
        fs::create_dir_all(&licenses_dir)?;
        fs::copy(&license, licenses_dir.join("LICENSE"))?;
        self.log_line(&format!("Copied license: {}", license_name));

        self.finish(CookStage::Packaged);
        Ok(())
    }

    fn expect_next(&self, target: CookStage) -> Result<()> {
        if self.stage.next() == Some(target) {
            Ok(())
        } else {
            Err(Error::ConfigurationError(format!(
                "Cannot enter {} from {}",
                target, self.stage
            )))
        }
    }

    fn finish(&mut self, stage: CookStage) {
        info!("Stage complete: {}", stage);
        self.log_line(&format!("=== {} ===", stage));
        self.stage = stage;
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }
}
