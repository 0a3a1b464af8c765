//! Update-baseline command implementation.

use anyhow::{Context, Result};

use std::path::Path;

/// Runs the update-baseline command.
///
/// Recomputes the full violation set and persists it as the accepted
/// baseline. Exits non-zero when files failed to parse or when violations
/// could not be recorded (references from untracked files).
pub fn run(path: &Path, no_cache: bool, config_file: Option<&Path>) -> Result<()> {
    let session = super::build_session(path, config_file, no_cache)?;

    tracing::info!("updating baseline from {} file(s)", session.files.len());
    let result = session
        .runner
        .update_baseline(&session.files)
        .context("failed to persist baseline")?;

    for failure in &result.parse_failures {
        println!("{}: failed to parse: {}", failure.file.display(), failure.message);
    }
    for offense in &result.offenses {
        println!("{offense}");
        println!("  (not recorded: file belongs to no package)");
    }

    if result.is_success() {
        println!(
            "Baseline updated for {} file(s) under {}",
            result.files_checked,
            session.config.root.display()
        );
        Ok(())
    } else {
        std::process::exit(1);
    }
}
