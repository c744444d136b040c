//! Capture-request validation and output-path resolution.

use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Directory under the operator's working directory that holds storage
/// state files by default.
pub const AUTH_DIR: &str = ".playwright-auth";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("--url is required")]
    MissingUrl,
    #[error("invalid --url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("either --output, or both --domain and --user, must be given")]
    MissingOutputSelector,
}

/// A validated capture invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub url: Url,
    pub output: PathBuf,
}

/// Validate the flag set and resolve the output path.
///
/// Either `output` is given explicitly, or both `domain` and `user` are
/// given and the path is derived as `./.playwright-auth/{domain}-{user}.json`.
/// Blank labels count as missing.
pub fn resolve_request(
    url: Option<&str>,
    domain: Option<&str>,
    user: Option<&str>,
    output: Option<&Path>,
) -> Result<CaptureRequest, UsageError> {
    let raw_url = url.map(str::trim).filter(|u| !u.is_empty());
    let Some(raw_url) = raw_url else {
        return Err(UsageError::MissingUrl);
    };
    let url = Url::parse(raw_url).map_err(|e| UsageError::InvalidUrl {
        url: raw_url.to_string(),
        reason: e.to_string(),
    })?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let domain = domain.map(str::trim).filter(|d| !d.is_empty());
            let user = user.map(str::trim).filter(|u| !u.is_empty());
            match (domain, user) {
                (Some(domain), Some(user)) => Path::new(".")
                    .join(AUTH_DIR)
                    .join(format!("{domain}-{user}.json")),
                _ => return Err(UsageError::MissingOutputSelector),
            }
        }
    };

    Ok(CaptureRequest { url, output })
}
