// src/cli.rs
//! CLI definitions for up-kitchen
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "up-kitchen")]
#[command(author = "up-kitchen Contributors")]
#[command(version)]
#[command(about = "Acquire, build and package the up-cpp uProtocol library from a recipe")]
#[command(long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Recipe selection shared by every command that resolves a configuration
#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Path to the recipe file
    pub recipe: PathBuf,

    /// Recipe version to use (default: newest declared version)
    #[arg(long = "pkg-version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Setting override, e.g. -s os=Windows -s compiler.version=193
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Option override, e.g. -o shared=True
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Profile file with [settings] and [options] tables
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Start from built-in settings instead of probing the host compiler
    #[arg(long)]
    pub no_detect: bool,
}

/// Workspace and tooling locations
#[derive(Args, Debug, Clone)]
pub struct WorkspaceArgs {
    /// Workspace holding the src/, build/ and install/ trees
    #[arg(short, long, default_value = "up-kitchen-build")]
    pub workspace: PathBuf,

    /// Directory for cached source archives
    #[arg(long)]
    pub source_cache: Option<PathBuf>,

    /// Number of parallel build jobs (default: available CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// cmake program to use instead of the one on PATH
    #[arg(long)]
    pub cmake: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: validate, acquire, build, install, clean, package
    Cook {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Print the package metadata as JSON
        #[arg(long)]
        json: bool,

        /// Also write the package metadata as JSON to this file
        #[arg(long)]
        metadata_out: Option<PathBuf>,
    },

    /// Validate the configuration and acquire both source trees without building
    Source {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        workspace: WorkspaceArgs,
    },

    /// Show the requirement list for a configuration
    Requirements {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the toolchain variables for a configuration
    Toolchain {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Print the generated CMake toolchain script instead
        #[arg(long, conflicts_with = "json")]
        cmake_script: bool,
    },

    /// Check a recipe and a configuration without side effects
    Validate {
        #[command(flatten)]
        recipe: RecipeArgs,
    },

    /// Show recipe metadata, versions and options
    Info {
        /// Path to the recipe file
        recipe: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
