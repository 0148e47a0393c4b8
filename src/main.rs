// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Cook {
            recipe,
            workspace,
            json,
            metadata_out,
        } => commands::cmd_cook(&recipe, &workspace, json, metadata_out.as_deref()),
        Commands::Source { recipe, workspace } => commands::cmd_source(&recipe, &workspace),
        Commands::Requirements { recipe, json } => commands::cmd_requirements(&recipe, json),
        Commands::Toolchain {
            recipe,
            workspace,
            json,
            cmake_script,
        } => commands::cmd_toolchain(&recipe, &workspace, json, cmake_script),
        Commands::Validate { recipe } => commands::cmd_validate(&recipe),
        Commands::Info { recipe, json } => commands::cmd_info(&recipe, json),
    }
}
