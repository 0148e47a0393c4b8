// tests/common/mod.rs

//! Shared test utilities: a sample recipe and recording fakes for the
//! fetcher and build tool capabilities.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;
use up_kitchen::recipe::kitchen::{BuildTool, GitTransport, SourceFetcher};
use up_kitchen::recipe::{ArchiveSource, BuildType, Recipe, ToolchainVariables, parse_recipe};
use up_kitchen::{Kitchen, KitchenConfig, Result};

/// Recipe with one version, both transports and the cross channel
pub const SAMPLE_RECIPE: &str = r#"
[package]
name = "up-cpp"
description = "This library provides a C++ uProtocol API for the development of uEntities"
license = "Apache-2.0"
homepage = "https://github.com/eclipse-uprotocol"
topics = ["cpp", "uprotocol"]
cross_channel = "cross/cross"

[versions."1.0.0".source]
url = "https://github.com/eclipse-uprotocol/up-cpp/archive/refs/tags/v1.0.0.tar.gz"
sha256 = "3f8e2f1a0c7b9d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d8e7f6a5b4c3d2e"

[versions."1.0.0".proto]
tag = "v1.5.8"
https = "https://github.com/eclipse-uprotocol/up-core-api.git"
ssh = "git@github.com:eclipse-uprotocol/up-core-api.git"
"#;

pub fn sample_recipe() -> Recipe {
    parse_recipe(SAMPLE_RECIPE).unwrap()
}

/// Shared, ordered record of collaborator calls
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Fetcher that fabricates source trees and records every call
pub struct RecordingFetcher {
    pub calls: CallLog,
    /// Ship a stale protocol tree inside the archive, like some upstream tarballs
    pub bundle_proto: bool,
}

impl RecordingFetcher {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            bundle_proto: false,
        }
    }
}

impl SourceFetcher for RecordingFetcher {
    fn fetch_archive(&self, source: &ArchiveSource, dest: &Path) -> Result<()> {
        self.calls.borrow_mut().push(format!("fetch {}", source.url));
        fs::write(dest.join("CMakeLists.txt"), "project(up-cpp)\n")?;
        fs::write(dest.join("LICENSE"), "Apache License 2.0\n")?;
        if self.bundle_proto {
            let stale = dest.join("up-core-api/uprotocol");
            fs::create_dir_all(&stale)?;
            fs::write(stale.join("stale.proto"), "syntax = \"proto2\";\n")?;
        }
        Ok(())
    }

    fn clone_repository(&self, url: &str, target: &Path) -> Result<()> {
        if target.exists() && fs::read_dir(target)?.next().is_some() {
            panic!("clone into non-empty directory {}", target.display());
        }
        self.calls.borrow_mut().push(format!("clone {}", url));
        let proto = target.join("uprotocol");
        fs::create_dir_all(&proto)?;
        fs::write(proto.join("uattributes.proto"), "syntax = \"proto3\";\n")?;
        Ok(())
    }

    fn checkout(&self, _repo_dir: &Path, tag: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("checkout {}", tag));
        Ok(())
    }
}

/// Build tool that records its invocations and installs a typical CMake tree
pub struct RecordingBuildTool {
    pub calls: CallLog,
    /// Toolchain variables seen at configure time
    pub configured: Rc<RefCell<Option<ToolchainVariables>>>,
}

impl RecordingBuildTool {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            configured: Rc::new(RefCell::new(None)),
        }
    }
}

impl BuildTool for RecordingBuildTool {
    fn configure(
        &self,
        _source_dir: &Path,
        build_dir: &Path,
        toolchain_file: &Path,
        vars: &ToolchainVariables,
    ) -> Result<()> {
        // cmake resolves a relative toolchain file against the build tree
        assert!(toolchain_file.is_absolute(), "{}", toolchain_file.display());
        assert!(toolchain_file.starts_with(build_dir));
        assert!(toolchain_file.is_file());
        self.calls.borrow_mut().push("configure".to_string());
        *self.configured.borrow_mut() = Some(vars.clone());
        Ok(())
    }

    fn build(&self, _build_dir: &Path, build_type: BuildType, _jobs: usize) -> Result<()> {
        self.calls.borrow_mut().push(format!("build {}", build_type));
        Ok(())
    }

    fn install(&self, _build_dir: &Path, _build_type: BuildType, prefix: &Path) -> Result<()> {
        assert!(prefix.is_absolute(), "{}", prefix.display());
        self.calls.borrow_mut().push("install".to_string());
        for (rel, content) in [
            ("include/up-cpp/datamodel/builder/Uuid.h", "#pragma once\n"),
            ("lib/libup-cpp.a", "!<arch>\n"),
            ("lib/libup-cpp.la", "# libtool\n"),
            ("lib/cmake/up-cpp/up-cppConfig.cmake", "# config\n"),
            ("lib/pkgconfig/up-cpp.pc", "Name: up-cpp\n"),
            ("share/doc/up-cpp/README.md", "docs\n"),
            ("bin/up-cpp.pdb", "pdb\n"),
        ] {
            let path = prefix.join(rel);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, content)?;
        }
        Ok(())
    }
}

/// Kitchen wired to recording fakes inside a fresh temp directory
pub struct TestKitchen {
    pub temp: TempDir,
    pub kitchen: Kitchen,
    pub calls: CallLog,
    pub configured: Rc<RefCell<Option<ToolchainVariables>>>,
}

impl TestKitchen {
    pub fn workspace(&self) -> PathBuf {
        self.temp.path().join("ws")
    }
}

/// Kitchen wired to recording fakes with an explicit workspace
pub fn kitchen_at(workspace: &Path, calls: &CallLog) -> Kitchen {
    let config = KitchenConfig {
        workspace: workspace.to_path_buf(),
        source_cache: workspace.join("cache"),
        jobs: 1,
        transport: GitTransport::default(),
        cmake: None,
    };
    Kitchen::new(
        config,
        Box::new(RecordingFetcher::new(calls.clone())),
        Box::new(RecordingBuildTool::new(calls.clone())),
    )
}

pub fn test_kitchen(bundle_proto: bool) -> TestKitchen {
    test_kitchen_with_transport(bundle_proto, GitTransport::default())
}

pub fn test_kitchen_with_transport(bundle_proto: bool, transport: GitTransport) -> TestKitchen {
    let temp = TempDir::new().unwrap();
    let calls: CallLog = Rc::new(RefCell::new(Vec::new()));

    let fetcher = RecordingFetcher {
        calls: calls.clone(),
        bundle_proto,
    };
    let build_tool = RecordingBuildTool::new(calls.clone());
    let configured = build_tool.configured.clone();

    let config = KitchenConfig {
        workspace: temp.path().join("ws"),
        source_cache: temp.path().join("cache"),
        jobs: 2,
        transport,
        cmake: None,
    };

    TestKitchen {
        kitchen: Kitchen::new(config, Box::new(fetcher), Box::new(build_tool)),
        temp,
        calls,
        configured,
    }
}
