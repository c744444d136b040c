//! Managed-browser installation into the skill directory.
//!
//! The skill directory lives outside any consuming project and holds a
//! small manifest plus the downloaded Chromium build. Every step here is
//! idempotent so setup can be re-run freely.

use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const BROWSERS_DIR: &str = "browsers";

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("no per-user data directory available; set AUTHCAP_HOME")]
    NoDataDir,
    #[error("failed to access skill directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to download Chromium: {0}")]
    Fetch(String),
    #[error("browser verification failed: {0}")]
    Verify(String),
}

/// Installation record kept at `{skill_dir}/manifest.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<PathBuf>,
}

impl Manifest {
    fn minimal() -> Self {
        Self {
            name: "authcap".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Self::default()
        }
    }
}

/// Resolve the skill directory: `$AUTHCAP_HOME` if set, else the per-user
/// local data dir.
pub fn skill_dir() -> Result<PathBuf, InstallError> {
    if let Ok(dir) = std::env::var("AUTHCAP_HOME") {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("authcap"))
        .ok_or(InstallError::NoDataDir)
}

pub fn load_manifest(dir: &Path) -> Result<Option<Manifest>, InstallError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn save_manifest(dir: &Path, manifest: &Manifest) -> Result<(), InstallError> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    std::fs::write(dir.join(MANIFEST_FILE), json)?;
    Ok(())
}

/// Create the skill directory and a minimal manifest if missing. Returns
/// the manifest and whether it had to be created.
pub fn ensure_manifest(dir: &Path) -> Result<(Manifest, bool), InstallError> {
    std::fs::create_dir_all(dir)?;
    if let Some(manifest) = load_manifest(dir)? {
        return Ok((manifest, false));
    }
    let manifest = Manifest::minimal();
    save_manifest(dir, &manifest)?;
    Ok((manifest, true))
}

/// The installed executable recorded in the manifest, if it still exists.
pub fn installed_executable(manifest: &Manifest) -> Option<PathBuf> {
    manifest
        .executable_path
        .as_ref()
        .filter(|path| path.is_file())
        .cloned()
}

/// Download a managed Chromium into `{skill_dir}/browsers` and record the
/// revision and executable in the manifest.
pub async fn install_browser(
    dir: &Path,
    manifest: &mut Manifest,
) -> Result<PathBuf, InstallError> {
    let download_dir = dir.join(BROWSERS_DIR);
    tokio::fs::create_dir_all(&download_dir).await?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&download_dir)
            .build()
            .map_err(|e| InstallError::Fetch(e.to_string()))?,
    );
    let info = fetcher
        .fetch()
        .await
        .map_err(|e| InstallError::Fetch(e.to_string()))?;

    tracing::info!(
        "downloaded Chromium revision {} to {}",
        info.revision,
        info.folder_path.display()
    );

    manifest.browser_revision = Some(info.revision.to_string());
    manifest.executable_path = Some(info.executable_path.clone());
    save_manifest(dir, manifest)?;

    Ok(info.executable_path)
}

/// Confirm the executable actually runs by asking it for its version.
pub async fn verify_browser(executable: &Path) -> Result<String, InstallError> {
    let output = tokio::process::Command::new(executable)
        .arg("--version")
        .output()
        .await
        .map_err(|e| InstallError::Verify(format!("{}: {e}", executable.display())))?;

    if !output.status.success() {
        return Err(InstallError::Verify(format!(
            "{} exited with {}: {}",
            executable.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
