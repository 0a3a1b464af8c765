//! Check command implementation.

use anyhow::Result;
use std::path::Path;

use crate::OutputFormat;

/// Runs the check command.
///
/// Exits non-zero when any offense or parse failure is found.
pub fn run(
    path: &Path,
    format: OutputFormat,
    no_cache: bool,
    config_file: Option<&Path>,
) -> Result<()> {
    let session = super::build_session(path, config_file, no_cache)?;

    tracing::info!("checking {} file(s)", session.files.len());
    let result = session.runner.check(&session.files);

    super::output::print(&result, format)?;

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
