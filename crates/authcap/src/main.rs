//! `save-auth-state`: open a visible browser, let the operator log in,
//! then persist the session's storage state to a JSON file.

use anyhow::Context;
use authcap_common::gitignore::{self, GitignoreAdvice};
use authcap_common::paths::{CaptureRequest, resolve_request};
use authcap_common::state::StorageState;
use authcap_h::cdp::CdpClient;
use authcap_h::{capture, install, session};
use clap::{CommandFactory, Parser};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "save-auth-state",
    version,
    about = "Capture a logged-in browser session to a storage state file",
    long_about = "Opens a visible browser window at --url, waits for you to \
log in, then saves the session's cookies and per-origin localStorage as a \
Playwright-compatible storage state JSON file.\n\nThe output path is either \
--output, or ./.playwright-auth/{domain}-{user}.json derived from --domain \
and --user."
)]
struct Args {
    /// Login page to open in the browser window
    #[arg(long)]
    url: Option<String>,

    /// Domain label for the default output name
    #[arg(long)]
    domain: Option<String>,

    /// User label for the default output name
    #[arg(long)]
    user: Option<String>,

    /// Explicit output path (overrides --domain/--user naming)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Logging goes to stderr so stdout stays operator-facing.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let request = match resolve_request(
        args.url.as_deref(),
        args.domain.as_deref(),
        args.user.as_deref(),
        args.output.as_deref(),
    ) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{}", Args::command().render_usage());
            eprintln!("Run save-auth-state --help for details.");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(request).await {
        eprintln!("Error: {e:#}");
        if session::looks_like_missing_browser(&format!("{e:#}")) {
            eprintln!("Hint: no usable browser found. Run authcap-setup to install a managed Chromium.");
        }
        std::process::exit(1);
    }
}

async fn run(request: CaptureRequest) -> anyhow::Result<()> {
    println!("Starting browser...");
    println!("Starting URL: {}", request.url);

    let client = session::launch_preferred(managed_executable()).await?;

    // Whatever happens past this point, the browser gets closed once.
    let outcome = drive(&client, &request).await;
    if let Err(e) = client.close().await {
        warn!("failed to close browser cleanly: {e}");
    }
    outcome?;

    report(&request.output)
}

async fn drive(client: &CdpClient, request: &CaptureRequest) -> anyhow::Result<()> {
    client.navigate(request.url.as_str()).await?;

    println!();
    println!("Please complete login in the browser window...");
    println!("After logging in, return here and press Enter to save the session.");
    wait_for_enter().await?;

    let mut state = capture::capture_storage_state(client).await?;
    state
        .save(&request.output)
        .with_context(|| format!("failed to write {}", request.output.display()))?;

    let changed = state.relax_strict_cookies();
    if !changed.is_empty() {
        for cookie in &changed {
            println!("Relaxed SameSite Strict -> Lax for cookie {cookie}");
        }
        state
            .save(&request.output)
            .with_context(|| format!("failed to rewrite {}", request.output.display()))?;
    }

    Ok(())
}

async fn wait_for_enter() -> anyhow::Result<()> {
    print!("Press Enter when ready to save... ");
    std::io::stdout().flush()?;

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    // EOF counts as confirmation; there is deliberately no timeout.
    lines.next_line().await?;
    Ok(())
}

fn report(output: &Path) -> anyhow::Result<()> {
    let display_path = output
        .canonicalize()
        .unwrap_or_else(|_| output.to_path_buf());
    let state = StorageState::load(output)
        .with_context(|| format!("failed to read back {}", output.display()))?;

    println!();
    println!("Authentication state saved to: {}", display_path.display());
    println!("Saved data:");
    println!("  - {} cookie(s)", state.cookies.len());
    println!("  - {} origin(s) with localStorage", state.origins.len());

    print_gitignore_advice(output);

    println!();
    println!("Done. Next steps:");
    println!(
        "  1. Point your automation at it, e.g. --storage-state={}",
        display_path.display()
    );
    println!("  2. Keep the auth file out of version control");
    Ok(())
}

fn print_gitignore_advice(output: &Path) {
    let advice = match gitignore::check(Path::new("."), output) {
        Ok(advice) => advice,
        Err(e) => {
            warn!("could not read .gitignore: {e}");
            return;
        }
    };

    match advice {
        GitignoreAdvice::Covered => {}
        GitignoreAdvice::MissingPattern { suggestions } => {
            println!();
            println!("Warning: auth file pattern not found in .gitignore");
            println!("Add these lines to avoid committing auth files:");
            for line in suggestions {
                println!("  {line}");
            }
        }
        GitignoreAdvice::NoGitignore { suggestions } => {
            println!();
            println!("Warning: no .gitignore found in the current directory");
            println!("Consider creating one so auth files are never committed:");
            for line in suggestions {
                println!("  {line}");
            }
        }
    }
}

fn managed_executable() -> Option<PathBuf> {
    let dir = install::skill_dir().ok()?;
    let manifest = install::load_manifest(&dir).ok()??;
    install::installed_executable(&manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_usage_text_renders_for_error_reports() {
        let usage = Args::command().render_usage().to_string();
        assert!(usage.contains("save-auth-state"));
        assert!(usage.contains("[OPTIONS]"));
    }

    #[test]
    fn test_all_flags_are_optional_at_parse_time() {
        // Validation (and its exit code) is ours, not clap's.
        let args = Args::try_parse_from(["save-auth-state"]).unwrap();
        assert!(args.url.is_none());
        assert!(args.output.is_none());
    }
}
