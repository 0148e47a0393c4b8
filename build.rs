// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Common argument: recipe file
fn recipe_arg() -> Arg {
    Arg::new("recipe").required(true).help("Path to the recipe file")
}

/// Arguments selecting a configuration
fn config_args() -> Vec<Arg> {
    vec![
        recipe_arg(),
        Arg::new("pkg_version")
            .long("pkg-version")
            .value_name("VERSION")
            .help("Recipe version to use (default: newest declared version)"),
        Arg::new("setting")
            .short('s')
            .long("setting")
            .value_name("KEY=VALUE")
            .action(ArgAction::Append)
            .help("Setting override, e.g. -s os=Windows"),
        Arg::new("option")
            .short('o')
            .long("option")
            .value_name("NAME=VALUE")
            .action(ArgAction::Append)
            .help("Option override, e.g. -o shared=True"),
        Arg::new("profile")
            .long("profile")
            .help("Profile file with [settings] and [options] tables"),
        Arg::new("no_detect")
            .long("no-detect")
            .action(ArgAction::SetTrue)
            .help("Start from built-in settings instead of probing the host compiler"),
    ]
}

/// Arguments locating the workspace and tools
fn workspace_args() -> Vec<Arg> {
    vec![
        Arg::new("workspace")
            .short('w')
            .long("workspace")
            .default_value("up-kitchen-build")
            .help("Workspace holding the src/, build/ and install/ trees"),
        Arg::new("source_cache")
            .long("source-cache")
            .help("Directory for cached source archives"),
        Arg::new("jobs")
            .short('j')
            .long("jobs")
            .help("Number of parallel build jobs"),
        Arg::new("cmake")
            .long("cmake")
            .help("cmake program to use instead of the one on PATH"),
    ]
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn build_cli() -> Command {
    Command::new("up-kitchen")
        .version(env!("CARGO_PKG_VERSION"))
        .author("up-kitchen Contributors")
        .about("Acquire, build and package the up-cpp uProtocol library from a recipe")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging (RUST_LOG takes precedence)"),
        )
        .subcommand(
            Command::new("cook")
                .about("Run the full pipeline: validate, acquire, build, install, clean, package")
                .args(config_args())
                .args(workspace_args())
                .arg(json_arg())
                .arg(
                    Arg::new("metadata_out")
                        .long("metadata-out")
                        .help("Also write the package metadata as JSON to this file"),
                ),
        )
        .subcommand(
            Command::new("source")
                .about("Validate the configuration and acquire both source trees without building")
                .args(config_args())
                .args(workspace_args()),
        )
        .subcommand(
            Command::new("requirements")
                .about("Show the requirement list for a configuration")
                .args(config_args())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("toolchain")
                .about("Show the toolchain variables for a configuration")
                .args(config_args())
                .args(workspace_args())
                .arg(json_arg())
                .arg(
                    Arg::new("cmake_script")
                        .long("cmake-script")
                        .action(ArgAction::SetTrue)
                        .help("Print the generated CMake toolchain script instead"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a recipe and a configuration without side effects")
                .args(config_args()),
        )
        .subcommand(
            Command::new("info")
                .about("Show recipe metadata, versions and options")
                .arg(recipe_arg())
                .arg(json_arg()),
        )
}

fn render(man: Man, path: &Path) -> Result<(), String> {
    let mut buffer = Vec::new();
    man.render(&mut buffer)
        .map_err(|e| format!("Failed to render {}: {}", path.display(), e))?;
    fs::write(path, buffer).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    if let Err(e) = render(Man::new(cmd.clone()), &man_dir.join("up-kitchen.1")) {
        println!("cargo:warning={}", e);
        return;
    }

    // One page per subcommand, named like git's
    for sub in cmd.get_subcommands() {
        let name = format!("up-kitchen-{}", sub.get_name());
        let path = man_dir.join(format!("{}.1", name));
        if let Err(e) = render(Man::new(sub.clone()).title(name), &path) {
            println!("cargo:warning={}", e);
        }
    }
}
