//! CLI command implementations.

pub mod check;
pub mod init;
pub mod output;
pub mod update;

use anyhow::{Context, Result};
use packbound_core::{
    BaselineStore, Cache, Configuration, ConstantResolver, DiskBaseline, PackageRegistry,
    Parser, Runner,
};
use packbound_ruby::RubyParser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A fully wired runner plus the file set it should process.
pub struct Session {
    /// Loaded project configuration.
    pub config: Configuration,
    /// The orchestrator.
    pub runner: Runner,
    /// Project-relative source files to process, sorted.
    pub files: Vec<PathBuf>,
}

/// Loads configuration and wires up a runner for the project at `path`.
pub fn build_session(path: &Path, config_file: Option<&Path>, no_cache: bool) -> Result<Session> {
    let config = Configuration::load_from(path, config_file)
        .context("failed to load project configuration")?;
    let registry = PackageRegistry::new(config.packages.clone())
        .context("invalid package configuration")?;
    let registry = Arc::new(registry);

    tracing::info!(
        "loaded {} package(s) under {}",
        registry.len(),
        config.root.display()
    );

    let resolver = Arc::new(ConstantResolver::new(
        config.root.clone(),
        config.load_paths.clone(),
        config.extension.clone(),
        config.inflector(),
    ));
    let baseline = Arc::new(DiskBaseline::new(config.root.clone()));

    let mut builder = Runner::builder()
        .root(config.root.clone())
        .registry(registry)
        .parser(Arc::new(RubyParser::new()) as Arc<dyn Parser>)
        .resolver(resolver)
        .baseline(baseline as Arc<dyn BaselineStore>)
        .fail_fast(config.fail_fast)
        .parallelism(config.parallelism);

    if config.cache_enabled && !no_cache {
        builder = builder.cache(Cache::new(config.cache_path(), &config.config_digest));
    }

    let runner = builder.build().context("failed to build runner")?;
    let files = discover_files(&config);

    Ok(Session {
        config,
        runner,
        files,
    })
}

/// Discovers source files under the project root, respecting gitignore
/// rules and the configured exclude patterns.
fn discover_files(config: &Configuration) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(&config.root)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|e| e == config.extension.as_str())
        })
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(&config.root)
                .map(Path::to_path_buf)
                .ok()
        })
        .filter(|relative| !config.is_excluded(relative))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn discover_files_filters_extension_and_excludes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/models/user.rb");
        write(dir.path(), "app/assets/logo.svg");
        write(dir.path(), "vendor/gems/dep.rb");

        let config = Configuration::load(dir.path()).unwrap();
        let files = discover_files(&config);

        assert_eq!(files, vec![PathBuf::from("app/models/user.rb")]);
    }

    #[test]
    fn discovered_files_are_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "lib/zeta.rb");
        write(dir.path(), "app/alpha.rb");

        let config = Configuration::load(dir.path()).unwrap();
        let files = discover_files(&config);

        assert_eq!(
            files,
            vec![PathBuf::from("app/alpha.rb"), PathBuf::from("lib/zeta.rb")]
        );
    }

    #[test]
    fn build_session_surfaces_configuration_errors() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "packs/billing/pack.toml");
        fs::write(
            dir.path().join("packs/billing/pack.toml"),
            "dependencies = [\"missing\"]",
        )
        .unwrap();

        let result = build_session(dir.path(), None, true);
        assert!(result.is_err());
    }
}
