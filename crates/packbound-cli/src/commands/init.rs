//! Init command: writes a starter configuration file.

use anyhow::{bail, Context, Result};
use packbound_core::ROOT_CONFIG_FILE;
use std::path::Path;

const STARTER_CONFIG: &str = r#"# packbound project configuration.
#
# Directories probed when resolving a constant name to its defining file,
# in order. `Billing::Charge` resolves to `<load_path>/billing/charge.rb`.
load_paths = ["app", "lib"]

# Source file extension to scan.
extension = "rb"

# Glob patterns excluded from scanning and package discovery.
exclude = ["**/vendor/**", "**/tmp/**"]

# Extraction cache; safe to delete at any time.
cache = true
cache_directory = "tmp/cache/packbound"

# Stop dispatching new files after the first parse failure.
fail_fast = false

# Per-segment inflection overrides for acronyms, e.g.:
# [inflections]
# "GraphQL" = "graphql"

# Declare a package by placing a `pack.toml` in its root directory:
#
#   name = "billing"
#   enforce_privacy = true          # or a list of constants
#   enforce_dependencies = true
#   public_path = "public"
#   dependencies = ["payments"]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let target = Path::new(ROOT_CONFIG_FILE);
    if target.exists() && !force {
        bail!("{ROOT_CONFIG_FILE} already exists (use --force to overwrite)");
    }

    std::fs::write(target, STARTER_CONFIG)
        .with_context(|| format!("failed to write {ROOT_CONFIG_FILE}"))?;
    println!("Wrote {ROOT_CONFIG_FILE}");
    Ok(())
}
