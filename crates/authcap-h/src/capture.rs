//! Storage-state export: context-wide cookies via `Storage.getCookies`
//! plus a localStorage snapshot per open http(s) origin.

use crate::cdp::{BrowserError, CdpClient};
use authcap_common::state::{Cookie, OriginState, SameSite, StorageState};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::cdp::browser_protocol::network::CookieSameSite;
use chromiumoxide::cdp::browser_protocol::storage::GetCookiesParams;
use std::collections::HashSet;

const LOCAL_STORAGE_SNAPSHOT_JS: &str = r#"
(() => {
  const entries = [];
  try {
    for (let i = 0; i < localStorage.length; i++) {
      const name = localStorage.key(i);
      entries.push({ name, value: localStorage.getItem(name) ?? "" });
    }
  } catch (e) {
    // localStorage can be denied (sandboxed frames, cookie-blocked pages)
  }
  return { origin: location.origin, localStorage: entries };
})()
"#;

/// Export the session exactly as the browser context holds it. Cookies are
/// taken context-wide, matching what `storageState()`-style exports contain.
pub async fn capture_storage_state(client: &CdpClient) -> Result<StorageState, BrowserError> {
    let cookies = export_cookies(&client.page).await?;
    let origins = export_origins(client).await?;
    Ok(StorageState { cookies, origins })
}

async fn export_cookies(page: &Page) -> Result<Vec<Cookie>, BrowserError> {
    let response = page
        .execute(GetCookiesParams::default())
        .await
        .map_err(|e| BrowserError::Capture(format!("Storage.getCookies failed: {e}")))?;

    Ok(response
        .result
        .cookies
        .into_iter()
        .map(cookie_from_cdp)
        .collect())
}

fn cookie_from_cdp(cookie: network::Cookie) -> Cookie {
    Cookie {
        name: cookie.name,
        value: cookie.value,
        domain: cookie.domain,
        path: cookie.path,
        expires: cookie.expires,
        http_only: cookie.http_only,
        secure: cookie.secure,
        same_site: cookie.same_site.map(same_site_from_cdp),
    }
}

fn same_site_from_cdp(same_site: CookieSameSite) -> SameSite {
    match same_site {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    }
}

/// Snapshot localStorage for every open page with an http(s) URL,
/// deduplicated by origin; origins without entries are omitted.
async fn export_origins(client: &CdpClient) -> Result<Vec<OriginState>, BrowserError> {
    let pages = client
        .browser
        .pages()
        .await
        .map_err(|e| BrowserError::Capture(format!("failed to list pages: {e}")))?;

    let mut seen = HashSet::new();
    let mut origins = Vec::new();

    for page in pages {
        let url = page.url().await.unwrap_or_default().unwrap_or_default();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            continue;
        }

        let snapshot: OriginState = match page.evaluate(LOCAL_STORAGE_SNAPSHOT_JS).await {
            Ok(eval) => match eval.into_value() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!("unreadable localStorage snapshot for {url}: {e}");
                    continue;
                }
            },
            Err(e) => {
                tracing::warn!("localStorage snapshot failed for {url}: {e}");
                continue;
            }
        };

        if snapshot.local_storage.is_empty() {
            continue;
        }
        if seen.insert(snapshot.origin.clone()) {
            origins.push(snapshot);
        }
    }

    Ok(origins)
}
