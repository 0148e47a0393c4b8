// src/recipe/kitchen/archive.rs

//! Archive and patch utilities for the Kitchen

use crate::error::{Error, Result};
use crate::hash::{Sha256Digest, hash_file};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Download a URL into `dest`, streaming with a progress bar
pub fn download_file(client: &Client, url: &str, dest: &mut File) -> Result<u64> {
    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::AcquisitionError(format!("Failed to download {}: {}", url, e)))?;

    let progress = match response.content_length() {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})")
    {
        progress.set_style(style.progress_chars("=> "));
    }
    progress.set_message(archive_filename(url));

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];
    loop {
        let n = response
            .read(&mut buffer)
            .map_err(|e| Error::acquisition(format!("Failed to read {}", url), e))?;
        if n == 0 {
            break;
        }
        dest.write_all(&buffer[..n])
            .map_err(|e| Error::acquisition("Failed to write download", e))?;
        downloaded += n as u64;
        progress.set_position(downloaded);
    }
    progress.finish_and_clear();

    debug!("Downloaded {} bytes from {}", downloaded, url);
    Ok(downloaded)
}

/// File name component of an archive URL
pub fn archive_filename(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "source.tar.gz".to_string())
}

/// Check a file against an expected digest
pub fn verify_file_checksum(path: &Path, expected: &Sha256Digest) -> Result<bool> {
    let actual = hash_file(path).map_err(|e| Error::acquisition(path.display(), e))?;
    Ok(&actual == expected)
}

/// Supported archive compressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    TarGz,
    Tar,
}

fn archive_kind(name: &str) -> Option<ArchiveKind> {
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if name.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else {
        None
    }
}

/// Extract an archive into `dest`
///
/// `format_hint` is the original file name, used to pick the decompressor
/// (cached archives are stored under their digest). With `strip_root`, the
/// first path component of every entry is dropped, flattening the usual
/// `name-version/` wrapper directory. Entries that would escape `dest` are
/// rejected.
pub fn extract_archive(
    archive: &Path,
    format_hint: &str,
    dest: &Path,
    strip_root: bool,
) -> Result<()> {
    let kind = archive_kind(format_hint).ok_or_else(|| {
        Error::AcquisitionError(format!("Unknown archive format: {}", format_hint))
    })?;

    let file = File::open(archive).map_err(|e| Error::acquisition(archive.display(), e))?;
    let reader: Box<dyn Read> = match kind {
        ArchiveKind::TarGz => Box::new(GzDecoder::new(file)),
        ArchiveKind::Tar => Box::new(file),
    };

    fs::create_dir_all(dest).map_err(|e| Error::acquisition(dest.display(), e))?;
    unpack_entries(tar::Archive::new(reader), dest, strip_root)
        .map_err(|e| Error::acquisition(format!("Failed to extract {}", archive.display()), e))?;

    info!("Extracted {} to {}", format_hint, dest.display());
    Ok(())
}

fn unpack_entries<R: Read>(
    mut archive: tar::Archive<R>,
    dest: &Path,
    strip_root: bool,
) -> io::Result<()> {
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let Some(relative) = entry_target(&path, strip_root)? else {
            continue;
        };

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
    }
    Ok(())
}

/// Relative destination of an archive entry, or `None` for the stripped root itself
fn entry_target(path: &Path, strip_root: bool) -> io::Result<Option<PathBuf>> {
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("archive entry escapes destination: {}", path.display()),
                ));
            }
        }
    }

    if strip_root {
        let mut components = relative.components();
        components.next();
        relative = components.as_path().to_path_buf();
    }

    if relative.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(relative))
    }
}

/// Apply a patch to the source directory
///
/// The patch is dry-run first, so a patch that does not apply cleanly
/// leaves the tree untouched.
pub fn apply_patch(source_dir: &Path, patch_path: &Path, strip: u32) -> Result<()> {
    let patch_name = patch_path.display().to_string();
    // `patch` runs inside the source tree
    let patch_path = std::path::absolute(patch_path)?;
    let program = which::which("patch").map_err(|e| Error::PatchError {
        patch: patch_name.clone(),
        reason: format!("patch program not found: {}", e),
    })?;

    for dry_run in [true, false] {
        let mut cmd = Command::new(&program);
        cmd.arg(format!("-p{}", strip))
            .arg("--forward")
            .arg("--batch")
            .arg("-i")
            .arg(&patch_path)
            .current_dir(source_dir);
        if dry_run {
            cmd.arg("--dry-run");
        }

        let output = cmd.output().map_err(|e| Error::PatchError {
            patch: patch_name.clone(),
            reason: format!("failed to run patch: {}", e),
        })?;

        if !output.status.success() {
            return Err(Error::PatchError {
                patch: patch_name,
                reason: format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }
    }

    Ok(())
}
