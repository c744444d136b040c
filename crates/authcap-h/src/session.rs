//! Browser-channel selection: prefer an installed system Chrome, fall back
//! once to the default Chromium resolution.

use crate::cdp::{BrowserError, CdpClient};
use std::path::PathBuf;
use tracing::{info, warn};

const CHROME_NAMES: &[&str] = &["google-chrome", "google-chrome-stable", "chrome"];

#[cfg(target_os = "macos")]
const CHROME_APP: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";

/// Launch the capture browser. Tries the preferred channel (system Chrome)
/// first; on failure logs the substitution and makes exactly one more
/// attempt with `managed` (the setup-installed Chromium) or chromiumoxide's
/// own executable detection.
pub async fn launch_preferred(managed: Option<PathBuf>) -> Result<CdpClient, BrowserError> {
    if let Some(chrome) = find_system_chrome() {
        info!("preferred channel: {}", chrome.display());
        match CdpClient::launch(Some(chrome.as_path())).await {
            Ok(client) => return Ok(client),
            Err(e) => {
                warn!("Chrome launch failed ({e}); falling back to default Chromium");
            }
        }
    }

    if let Some(managed) = &managed {
        info!("using managed Chromium: {}", managed.display());
    }
    CdpClient::launch(managed.as_deref()).await
}

fn find_system_chrome() -> Option<PathBuf> {
    if let Ok(bin) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(bin);
        if path.is_file() {
            return Some(path);
        }
        warn!(
            "CHROME_BIN is set but does not point at a file: {}",
            path.display()
        );
    }

    #[cfg(target_os = "macos")]
    {
        let app = std::path::Path::new(CHROME_APP);
        if app.is_file() {
            return Some(app.to_path_buf());
        }
    }

    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in CHROME_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Heuristic for the "no usable browser executable" launch failures, so
/// the CLI can point the operator at `authcap-setup`.
pub fn looks_like_missing_browser(message: &str) -> bool {
    message.contains("Could not auto detect a chrome executable")
        || message.contains("No such file or directory")
        || message.contains("program not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_browser_signatures_are_recognized() {
        assert!(looks_like_missing_browser(
            "failed to launch browser: Could not auto detect a chrome executable"
        ));
        assert!(looks_like_missing_browser(
            "failed to launch browser: No such file or directory (os error 2)"
        ));
    }

    #[test]
    fn test_other_failures_get_no_setup_hint() {
        assert!(!looks_like_missing_browser("navigation failed: net::ERR_NAME_NOT_RESOLVED"));
        assert!(!looks_like_missing_browser("browser handler task ended"));
    }
}
