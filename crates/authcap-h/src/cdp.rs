//! Chromium lifecycle over the Chrome DevTools Protocol, always headed:
//! the whole point is a window the operator can log into.

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("storage state capture failed: {0}")]
    Capture(String),
    #[error("failed to close browser: {0}")]
    Close(String),
}

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    /// Launch a visible browser window with an isolated profile.
    /// `executable` overrides chromiumoxide's auto-detection when given.
    pub async fn launch(executable: Option<&Path>) -> Result<Self, BrowserError> {
        let mut config_builder = BrowserConfig::builder().with_head();
        config_builder = config_builder.no_sandbox(); // needed in docker/CI/restricted envs
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;
        config_builder = config_builder.user_data_dir(&user_data_dir);

        if let Some(executable) = executable {
            tracing::info!("using browser executable: {}", executable.display());
            config_builder = config_builder.chrome_executable(executable);
        }

        let (browser, mut handler) = Browser::launch(
            config_builder
                .build()
                .map_err(|e| BrowserError::Launch(format!("invalid browser config: {e}")))?,
        )
        .await
        .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Drain the CDP event stream for the lifetime of the browser.
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("browser handler error (ignoring): {e}");
                }
            }
            tracing::debug!("browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(format!("failed to create page: {e}")))?;

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    pub async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        tracing::info!("navigating to {url}");
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), BrowserError> {
        self.browser
            .close()
            .await
            .map_err(|e| BrowserError::Close(e.to_string()))?;
        self.handler_task
            .await
            .map_err(|e| BrowserError::Close(format!("error awaiting handler: {e}")))?;

        if self.cleanup_user_data_dir {
            if let Some(dir) = &self.user_data_dir {
                if let Err(e) = std::fs::remove_dir_all(dir) {
                    tracing::debug!("failed to clean up user-data-dir {}: {}", dir.display(), e);
                }
            }
        }

        Ok(())
    }
}

fn resolve_user_data_dir() -> Result<(PathBuf, bool), BrowserError> {
    if let Ok(dir) = std::env::var("AUTHCAP_USER_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)
            .map_err(|e| BrowserError::Launch(format!("cannot create user data dir: {e}")))?;
        tracing::info!(
            "using user data dir from AUTHCAP_USER_DATA_DIR: {}",
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BrowserError::Launch(format!("system clock error: {e}")))?
        .as_nanos();
    let unique = format!("authcap-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)
        .map_err(|e| BrowserError::Launch(format!("cannot create user data dir: {e}")))?;
    tracing::info!("using isolated user data dir: {}", path.display());
    Ok((path, true))
}
