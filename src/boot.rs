use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &["website", "website/db", "website/uploads"];

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories and aborts if the database directory is unusable.
pub fn run() {
    info!("Showcase boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    for dir in REQUIRED_DIRS {
        let path = Path::new(dir);
        if !path.exists() {
            match fs::create_dir_all(path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Database directory writable ──────────────────
    if let Err(e) = check_writable(Path::new("website/db")) {
        error!("  Database directory not writable: {}", e);
        errors += 1;
    }

    // ── 3. Uploads directory writable ───────────────────
    if let Err(e) = check_writable(Path::new("website/uploads")) {
        warn!("  Uploads directory not writable: {} (local uploads will fail)", e);
        warnings += 1;
    }

    // ── 4. Rocket.toml / secret key ─────────────────────
    if !Path::new("Rocket.toml").exists() && std::env::var("ROCKET_SECRET_KEY").is_err() {
        warn!("  No Rocket.toml or ROCKET_SECRET_KEY, admin sessions will not survive a restart");
        warnings += 1;
    }

    // ── Summary ─────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!("Boot check passed with {} warning(s).", warnings);
    } else {
        info!("Boot check passed.");
    }
}

fn check_writable(dir: &Path) -> std::io::Result<()> {
    let test_file = dir.join(".write_test");
    fs::write(&test_file, "test")?;
    let _ = fs::remove_file(&test_file);
    Ok(())
}
