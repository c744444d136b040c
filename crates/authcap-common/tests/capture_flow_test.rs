//! End-to-end flow over the pure parts: resolve flags, persist a captured
//! document, relax the cookie policy, re-read for counts, and get the
//! gitignore advisory -- everything except the live browser.

use authcap_common::gitignore::{self, GitignoreAdvice};
use authcap_common::paths::{UsageError, resolve_request};
use authcap_common::state::{Cookie, LocalStorageEntry, OriginState, SameSite, StorageState};
use std::path::Path;

fn captured_state() -> StorageState {
    StorageState {
        cookies: vec![
            Cookie {
                name: "session".to_string(),
                value: "abc123".to_string(),
                domain: ".github.com".to_string(),
                path: "/".to_string(),
                expires: 4102444800.0,
                http_only: true,
                secure: true,
                same_site: Some(SameSite::Strict),
            },
            Cookie {
                name: "prefs".to_string(),
                value: "dark".to_string(),
                domain: ".github.com".to_string(),
                path: "/".to_string(),
                expires: -1.0,
                http_only: false,
                secure: true,
                same_site: Some(SameSite::Lax),
            },
        ],
        origins: vec![OriginState {
            origin: "https://github.com".to_string(),
            local_storage: vec![LocalStorageEntry {
                name: "color-mode".to_string(),
                value: "dark".to_string(),
            }],
        }],
    }
}

#[test]
fn test_full_capture_file_lifecycle() {
    let workdir = tempfile::tempdir().unwrap();

    let request = resolve_request(
        Some("https://github.com/login"),
        Some("github"),
        Some("alice"),
        None,
    )
    .unwrap();
    assert_eq!(
        request.output,
        Path::new("./.playwright-auth/github-alice.json")
    );

    // Re-root the relative path into the temp dir for the test.
    let output = workdir.path().join(".playwright-auth/github-alice.json");

    let mut state = captured_state();
    state.save(&output).unwrap();

    let changed = state.relax_strict_cookies();
    assert_eq!(changed, vec!["session@.github.com".to_string()]);
    state.save(&output).unwrap();

    let on_disk = StorageState::load(&output).unwrap();
    assert_eq!(on_disk.cookies.len(), 2);
    assert_eq!(on_disk.origins.len(), 1);
    assert_eq!(on_disk.cookies[0].same_site, Some(SameSite::Lax));
    // nothing else about the strict cookie changed
    assert_eq!(on_disk.cookies[0].value, "abc123");
    assert_eq!(on_disk.cookies[0].expires, 4102444800.0);
    // the already-lax cookie is untouched
    assert_eq!(on_disk.cookies[1], state.cookies[1]);

    // advisory: no .gitignore in the temp workdir
    let advice = gitignore::check(workdir.path(), &request.output).unwrap();
    let GitignoreAdvice::NoGitignore { suggestions } = advice else {
        panic!("expected NoGitignore advice");
    };
    assert_eq!(suggestions, vec![".playwright-auth/".to_string()]);
    assert!(!workdir.path().join(".gitignore").exists());
}

#[test]
fn test_usage_errors_fire_before_any_capture_work() {
    assert_eq!(
        resolve_request(None, None, None, None).unwrap_err(),
        UsageError::MissingUrl
    );
    assert_eq!(
        resolve_request(Some("https://example.com"), Some("github"), None, None).unwrap_err(),
        UsageError::MissingOutputSelector
    );
}

#[test]
fn test_on_disk_shape_matches_playwright_consumers() {
    let workdir = tempfile::tempdir().unwrap();
    let output = workdir.path().join("state.json");
    captured_state().save(&output).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert!(raw["cookies"].is_array());
    assert!(raw["origins"].is_array());
    assert_eq!(raw["cookies"][0]["sameSite"], "Strict");
    assert_eq!(raw["cookies"][0]["httpOnly"], true);
    assert_eq!(raw["origins"][0]["localStorage"][0]["value"], "dark");
}
