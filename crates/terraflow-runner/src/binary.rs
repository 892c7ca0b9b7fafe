//! Terraform binary download and caching
//!
//! Releases are fetched from HashiCorp once per version and kept under the
//! configured cache directory.

use crate::error::{Result, TerraformError};
use std::path::{Path, PathBuf};
use terraflow_config::Settings;
use tokio::fs;
use tokio::process::Command;

const RELEASES_URL: &str = "https://releases.hashicorp.com/terraform";

/// Name of the executable inside the release archive
pub fn binary_name() -> &'static str {
    if cfg!(windows) { "terraform.exe" } else { "terraform" }
}

/// Map a Rust OS/arch pair onto the names HashiCorp uses in release files
pub fn platform_for(os: &str, arch: &str) -> Result<(&'static str, &'static str)> {
    let release_os = match os {
        "linux" => "linux",
        "windows" => "windows",
        "macos" => "darwin",
        "freebsd" => "freebsd",
        "openbsd" => "openbsd",
        "solaris" => "solaris",
        _ => return Err(unsupported(os, arch)),
    };

    let release_arch = match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "arm" => "arm",
        "aarch64" => "arm64",
        _ => return Err(unsupported(os, arch)),
    };

    Ok((release_os, release_arch))
}

/// Platform of the running process
pub fn current_platform() -> Result<(&'static str, &'static str)> {
    platform_for(std::env::consts::OS, std::env::consts::ARCH)
}

pub fn download_url(version: &str, os: &str, arch: &str) -> String {
    format!(
        "{}/{}/terraform_{}_{}_{}.zip",
        RELEASES_URL, version, version, os, arch
    )
}

fn unsupported(os: &str, arch: &str) -> TerraformError {
    TerraformError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    }
}

/// Path of the cached binary for the configured version, fetching it first
/// if it is not there yet
pub async fn ensure_binary(settings: &Settings) -> Result<PathBuf> {
    let dir = settings.binary_dir();
    let path = dir.join(binary_name());

    if !path.is_file() {
        let (os, arch) = current_platform()?;
        let url = download_url(&settings.terraform_version, os, arch);
        tracing::info!(
            "Downloading terraform {} from {} to {}",
            settings.terraform_version,
            url,
            path.display()
        );
        download_and_extract(&url, &dir).await?;
    } else {
        tracing::debug!("Using cached terraform at {}", path.display());
    }

    make_executable(&path).await?;
    Ok(path)
}

async fn download_and_extract(url: &str, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).await?;

    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(TerraformError::DownloadFailed {
            url: url.to_string(),
            message: response.status().to_string(),
        });
    }
    let bytes = response.bytes().await?;

    let archive = tempfile::Builder::new()
        .prefix("terraform-")
        .suffix(".zip")
        .tempfile_in(dir)?;
    fs::write(archive.path(), &bytes).await?;

    extract_binary(archive.path(), dir).await?;
    Ok(())
}

/// Unpack the terraform executable from `archive` into `dir`
///
/// unzip writes into a staging directory inside `dir`; the binary is renamed
/// into place only after it exits successfully.
async fn extract_binary(archive: &Path, dir: &Path) -> Result<PathBuf> {
    let staging = tempfile::Builder::new()
        .prefix(".terraform-")
        .tempdir_in(dir)?;

    // zip展開は unzip コマンドに任せる
    let output = Command::new("unzip")
        .arg("-o")
        .arg(archive)
        .arg(binary_name())
        .arg("-d")
        .arg(staging.path())
        .output()
        .await
        .map_err(|e| {
            TerraformError::ExtractFailed(format!("could not run unzip: {}", e))
        })?;

    if !output.status.success() {
        return Err(TerraformError::ExtractFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let target = dir.join(binary_name());
    fs::rename(staging.path().join(binary_name()), &target).await?;
    Ok(target)
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o555)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
