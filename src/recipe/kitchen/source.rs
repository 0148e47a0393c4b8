// src/recipe/kitchen/source.rs

//! Dual-source resolution
//!
//! The primary tree comes from a pinned, checksummed archive. The protocol
//! schema comes from a git repository cloned into a subpath of that tree and
//! checked out at a pinned tag. The steps run strictly in order: extract,
//! remove the stale subpath, clone into the now-empty subpath, check out.

use crate::error::{Error, Result};
use crate::hash::Sha256Digest;
use crate::recipe::format::{ArchiveSource, PatchInfo, Recipe};
use crate::recipe::kitchen::archive::{
    archive_filename, download_file, extract_archive, verify_file_checksum,
};
use crate::recipe::parser::DEFAULT_TRANSPORT;
use reqwest::blocking::Client;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Environment variable selecting the protocol repository transport
pub const GIT_METHOD_ENV: &str = "GIT_METHOD";

/// Capability for acquiring source trees
///
/// The kitchen never fetches or clones directly; everything goes through this
/// trait so the pipeline can be driven against a fake in tests.
pub trait SourceFetcher {
    /// Fetch a pinned archive and extract it into `dest`
    fn fetch_archive(&self, source: &ArchiveSource, dest: &Path) -> Result<()>;

    /// Clone a repository into `target`, which must not exist or be empty
    fn clone_repository(&self, url: &str, target: &Path) -> Result<()>;

    /// Check out a tag in an existing clone
    fn checkout(&self, repo_dir: &Path, tag: &str) -> Result<()>;
}

/// Transport key used to pick the protocol repository URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GitTransport(String);

impl GitTransport {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Interpret a raw environment value; unset or empty means https
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self(v.to_string()),
            _ => Self::default(),
        }
    }

    /// Read the transport from `GIT_METHOD`
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(GIT_METHOD_ENV).ok().as_deref())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GitTransport {
    fn default() -> Self {
        Self(DEFAULT_TRANSPORT.to_string())
    }
}

impl fmt::Display for GitTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the resolver needs, looked up from the recipe up front
///
/// Building a plan touches nothing on disk, so an unknown version or
/// transport is reported before any side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    pub version: String,
    pub archive: ArchiveSource,
    pub proto_url: String,
    pub proto_tag: String,
    /// Clone target, relative to the primary tree
    pub proto_dir: PathBuf,
    pub patches: Vec<PatchInfo>,
    pub transport: GitTransport,
}

impl SourcePlan {
    pub fn new(recipe: &Recipe, version: &str, transport: GitTransport) -> Result<Self> {
        let data = recipe.version_data(version).ok_or_else(|| {
            Error::ConfigurationError(format!(
                "{} has no source data for version '{}' (known: {})",
                recipe.package.name,
                version,
                recipe.known_versions().join(", ")
            ))
        })?;

        let proto_url = data.proto.url_for(transport.as_str()).ok_or_else(|| {
            let known: Vec<&str> = data.proto.urls.keys().map(String::as_str).collect();
            Error::ConfigurationError(format!(
                "No protocol repository URL for transport '{}' in version {} (known: {})",
                transport,
                version,
                known.join(", ")
            ))
        })?;

        Ok(Self {
            version: version.to_string(),
            archive: data.source.clone(),
            proto_url: proto_url.to_string(),
            proto_tag: data.proto.tag.clone(),
            proto_dir: recipe.layout.proto_checkout_dir(),
            patches: data.patches.clone(),
            transport,
        })
    }
}

/// Where an acquired tree came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceOrigin {
    Archive { url: String, sha256: String },
    Git { url: String },
}

/// One acquired source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTree {
    pub origin: SourceOrigin,
    pub path: PathBuf,
    /// Pinned revision: the archive digest or the checked-out tag
    pub revision: String,
}

/// Result of dual-source resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSources {
    pub primary: SourceTree,
    pub auxiliary: SourceTree,
}

/// Acquire both trees into `source_dir`
///
/// `source_dir` is cleared first, so a retry after any failure starts from
/// scratch.
pub fn resolve_sources(
    fetcher: &dyn SourceFetcher,
    plan: &SourcePlan,
    source_dir: &Path,
) -> Result<ResolvedSources> {
    if source_dir.exists() {
        debug!("Clearing source directory {}", source_dir.display());
        fs::remove_dir_all(source_dir)
            .map_err(|e| Error::acquisition(source_dir.display(), e))?;
    }
    fs::create_dir_all(source_dir).map_err(|e| Error::acquisition(source_dir.display(), e))?;

    info!("Fetching primary source: {}", plan.archive.url);
    fetcher.fetch_archive(&plan.archive, source_dir)?;

    let proto_dir = source_dir.join(&plan.proto_dir);
    if proto_dir.exists() {
        debug!("Removing bundled protocol tree {}", proto_dir.display());
        fs::remove_dir_all(&proto_dir).map_err(|e| Error::acquisition(proto_dir.display(), e))?;
    }
    ensure_empty_target(&proto_dir)?;

    info!(
        "Cloning protocol repository ({}): {}",
        plan.transport, plan.proto_url
    );
    fetcher.clone_repository(&plan.proto_url, &proto_dir)?;

    info!("Checking out {}", plan.proto_tag);
    fetcher.checkout(&proto_dir, &plan.proto_tag)?;

    Ok(ResolvedSources {
        primary: SourceTree {
            origin: SourceOrigin::Archive {
                url: plan.archive.url.clone(),
                sha256: plan.archive.sha256.clone(),
            },
            path: source_dir.to_path_buf(),
            revision: plan.archive.sha256.clone(),
        },
        auxiliary: SourceTree {
            origin: SourceOrigin::Git {
                url: plan.proto_url.clone(),
            },
            path: proto_dir,
            revision: plan.proto_tag.clone(),
        },
    })
}

fn ensure_empty_target(target: &Path) -> Result<()> {
    if !target.exists() {
        return Ok(());
    }
    let mut entries =
        fs::read_dir(target).map_err(|e| Error::acquisition(target.display(), e))?;
    if entries.next().is_some() {
        return Err(Error::AcquisitionError(format!(
            "Clone target is not empty: {}",
            target.display()
        )));
    }
    Ok(())
}

/// Fetcher backed by HTTP downloads and the system `git`
pub struct NetworkFetcher {
    source_cache: PathBuf,
    client: Client,
}

impl NetworkFetcher {
    pub fn new(source_cache: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .user_agent(concat!("up-kitchen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::AcquisitionError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            source_cache: source_cache.into(),
            client,
        })
    }

    /// Return a verified cached copy of the archive, downloading if needed
    fn cached_archive(&self, source: &ArchiveSource) -> Result<PathBuf> {
        let expected = Sha256Digest::parse(&source.sha256)
            .map_err(|e| Error::ParseError(format!("Invalid sha256 for {}: {}", source.url, e)))?;

        fs::create_dir_all(&self.source_cache)
            .map_err(|e| Error::acquisition(self.source_cache.display(), e))?;

        let cached_path = self
            .source_cache
            .join(format!("{}-{}", expected, archive_filename(&source.url)));

        if cached_path.exists() {
            debug!("Using cached source: {}", cached_path.display());
            if verify_file_checksum(&cached_path, &expected)? {
                return Ok(cached_path);
            }
            warn!("Cached file checksum mismatch, re-downloading");
            fs::remove_file(&cached_path)
                .map_err(|e| Error::acquisition(cached_path.display(), e))?;
        }

        info!("Downloading: {}", source.url);
        let mut temp = NamedTempFile::new_in(&self.source_cache)
            .map_err(|e| Error::acquisition("Failed to create temporary file", e))?;
        download_file(&self.client, &source.url, temp.as_file_mut())?;

        let actual = crate::hash::hash_file(temp.path())
            .map_err(|e| Error::acquisition(temp.path().display(), e))?;
        if actual != expected {
            return Err(Error::ChecksumMismatch {
                path: PathBuf::from(&source.url),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        temp.persist(&cached_path)
            .map_err(|e| Error::acquisition(cached_path.display(), e.error))?;
        Ok(cached_path)
    }

    fn git(&self, args: &[&str], dir: Option<&Path>) -> Result<()> {
        let program = which::which("git")
            .map_err(|e| Error::AcquisitionError(format!("git not found: {}", e)))?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        debug!("Running: git {}", args.join(" "));

        let output = cmd
            .output()
            .map_err(|e| Error::acquisition("Failed to run git", e))?;
        if !output.status.success() {
            return Err(Error::AcquisitionError(format!(
                "git {} failed ({}): {}",
                args.first().copied().unwrap_or_default(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl SourceFetcher for NetworkFetcher {
    fn fetch_archive(&self, source: &ArchiveSource, dest: &Path) -> Result<()> {
        let archive = self.cached_archive(source)?;
        extract_archive(
            &archive,
            &archive_filename(&source.url),
            dest,
            source.strip_root,
        )
    }

    fn clone_repository(&self, url: &str, target: &Path) -> Result<()> {
        ensure_empty_target(target)?;
        let target = target.to_string_lossy();
        self.git(&["clone", "--quiet", url, &target], None)
    }

    fn checkout(&self, repo_dir: &Path, tag: &str) -> Result<()> {
        let tag_ref = format!("refs/tags/{}", tag);
        self.git(&["checkout", "--quiet", "--detach", &tag_ref], Some(repo_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::parse_recipe;
    use std::cell::RefCell;
    use tempfile::TempDir;

    const RECIPE: &str = r#"
[package]
name = "up-cpp"

[versions."0.1.0".source]
url = "https://example.com/up-cpp-0.1.0.tar.gz"
sha256 = "0000000000000000000000000000000000000000000000000000000000000000"

[versions."0.1.0".proto]
tag = "v1.5.6"
https = "https://example.com/up-core-api.git"
ssh = "git@example.com:up-core-api.git"
"#;

    #[derive(Default)]
    struct FakeFetcher {
        calls: RefCell<Vec<String>>,
        bundle_proto: bool,
    }

    impl SourceFetcher for FakeFetcher {
        fn fetch_archive(&self, source: &ArchiveSource, dest: &Path) -> Result<()> {
            self.calls.borrow_mut().push(format!("fetch {}", source.url));
            fs::write(dest.join("CMakeLists.txt"), "project(up-cpp)")?;
            if self.bundle_proto {
                fs::create_dir_all(dest.join("up-core-api/uprotocol"))?;
                fs::write(dest.join("up-core-api/uprotocol/stale.proto"), "old")?;
            }
            Ok(())
        }

        fn clone_repository(&self, url: &str, target: &Path) -> Result<()> {
            ensure_empty_target(target)?;
            self.calls.borrow_mut().push(format!("clone {}", url));
            fs::create_dir_all(target.join("uprotocol"))?;
            fs::write(target.join("uprotocol/core.proto"), "new")?;
            Ok(())
        }

        fn checkout(&self, _repo_dir: &Path, tag: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("checkout {}", tag));
            Ok(())
        }
    }

    #[test]
    fn test_transport_from_env_value() {
        assert_eq!(GitTransport::from_env_value(None).as_str(), "https");
        assert_eq!(GitTransport::from_env_value(Some("")).as_str(), "https");
        assert_eq!(GitTransport::from_env_value(Some("ssh")).as_str(), "ssh");
    }

    #[test]
    fn test_plan_selects_transport_url() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let plan = SourcePlan::new(&recipe, "0.1.0", GitTransport::default()).unwrap();
        assert_eq!(plan.proto_url, "https://example.com/up-core-api.git");
        assert_eq!(plan.proto_tag, "v1.5.6");

        let plan = SourcePlan::new(&recipe, "0.1.0", GitTransport::new("ssh")).unwrap();
        assert_eq!(plan.proto_url, "git@example.com:up-core-api.git");
    }

    #[test]
    fn test_plan_unknown_version_or_transport() {
        let recipe = parse_recipe(RECIPE).unwrap();
        assert!(matches!(
            SourcePlan::new(&recipe, "9.9.9", GitTransport::default()),
            Err(Error::ConfigurationError(_))
        ));
        assert!(matches!(
            SourcePlan::new(&recipe, "0.1.0", GitTransport::new("svn")),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_resolve_replaces_bundled_proto_tree() {
        let tmp = TempDir::new().unwrap();
        let source_dir = tmp.path().join("src");
        let recipe = parse_recipe(RECIPE).unwrap();
        let plan = SourcePlan::new(&recipe, "0.1.0", GitTransport::default()).unwrap();
        let fetcher = FakeFetcher {
            bundle_proto: true,
            ..Default::default()
        };

        let resolved = resolve_sources(&fetcher, &plan, &source_dir).unwrap();

        assert!(!source_dir.join("up-core-api/uprotocol/stale.proto").exists());
        assert!(source_dir.join("up-core-api/uprotocol/core.proto").is_file());
        assert_eq!(resolved.auxiliary.revision, "v1.5.6");
        assert_eq!(
            *fetcher.calls.borrow(),
            vec![
                "fetch https://example.com/up-cpp-0.1.0.tar.gz",
                "clone https://example.com/up-core-api.git",
                "checkout v1.5.6",
            ]
        );
    }

    #[test]
    fn test_resolve_clears_previous_attempt() {
        let tmp = TempDir::new().unwrap();
        let source_dir = tmp.path().join("src");
        fs::create_dir_all(source_dir.join("up-core-api")).unwrap();
        fs::write(source_dir.join("leftover.txt"), "x").unwrap();

        let recipe = parse_recipe(RECIPE).unwrap();
        let plan = SourcePlan::new(&recipe, "0.1.0", GitTransport::default()).unwrap();
        resolve_sources(&FakeFetcher::default(), &plan, &source_dir).unwrap();

        assert!(!source_dir.join("leftover.txt").exists());
        assert!(source_dir.join("CMakeLists.txt").is_file());
    }

    #[test]
    fn test_ensure_empty_target() {
        let tmp = TempDir::new().unwrap();
        assert!(ensure_empty_target(&tmp.path().join("missing")).is_ok());
        assert!(ensure_empty_target(tmp.path()).is_ok());
        fs::write(tmp.path().join("f"), "x").unwrap();
        assert!(matches!(
            ensure_empty_target(tmp.path()),
            Err(Error::AcquisitionError(_))
        ));
    }
}
