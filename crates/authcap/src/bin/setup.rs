//! `authcap-setup`: idempotently provision the skill directory with a
//! manifest and a managed Chromium so `save-auth-state` works without
//! touching the operator's project.

use anyhow::Context;
use authcap_h::install;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Setup failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    println!("authcap setup");
    let dir = install::skill_dir()?;
    println!("Skill directory: {}", dir.display());
    println!("(Dependencies are installed here, not in your project)");
    println!();

    let (mut manifest, created) = install::ensure_manifest(&dir)?;
    if created {
        println!("[+] manifest.json created");
    } else {
        println!("[+] manifest.json already present");
    }

    let executable = match install::installed_executable(&manifest) {
        Some(executable) => {
            println!("[+] Chromium already installed: {}", executable.display());
            executable
        }
        None => {
            println!("[~] Downloading managed Chromium (this can take a while)...");
            let executable = install::install_browser(&dir, &mut manifest).await?;
            println!("[+] Chromium installed: {}", executable.display());
            executable
        }
    };

    let version = install::verify_browser(&executable).await.context(
        "installed browser failed to run; delete the skill directory and re-run authcap-setup",
    )?;
    println!("[+] Browser responds: {version}");

    println!();
    println!("Setup complete.");
    println!("Next steps:");
    println!("  1. Run save-auth-state to capture a login session");
    println!("  2. Point your automation at the saved storage state file");
    Ok(())
}
