//! Resolution of constant names to defining files and packages.
//!
//! Mirrors the conventional namespace-to-autoload-path mapping of the host
//! codebase's class loader: nested name segments become nested directory and
//! file path segments under configured load paths, and the first candidate
//! path that exists on disk wins.

use crate::inflector::Inflector;
use crate::reference::{ConstantContext, UnresolvedReference};
use crate::registry::PackageRegistry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::trace;

/// Resolves constant names against the filesystem snapshot taken at
/// run start.
///
/// A pure function of the registry, load paths, and filesystem; filesystem
/// probes are memoized per candidate name for the duration of a run, and
/// the memo is safe for concurrent use.
#[derive(Debug)]
pub struct ConstantResolver {
    /// Absolute project root.
    root: PathBuf,
    /// Load paths relative to the root, in probe order.
    load_paths: Vec<PathBuf>,
    /// Source file extension, without the leading dot.
    extension: String,
    inflector: Inflector,
    /// Candidate name → probe outcome, memoized per run.
    probes: RwLock<HashMap<String, Option<PathBuf>>>,
}

impl ConstantResolver {
    /// Creates a resolver over the given load paths.
    #[must_use]
    pub fn new(
        root: PathBuf,
        load_paths: Vec<PathBuf>,
        extension: impl Into<String>,
        inflector: Inflector,
    ) -> Self {
        Self {
            root,
            load_paths,
            extension: extension.into(),
            inflector,
            probes: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves an unresolved reference to its defining file and public
    /// classification.
    ///
    /// Candidates are probed innermost-first: the constant name appended to
    /// the full enclosing nesting, then to each shorter prefix of the
    /// nesting, ending at top level. A reference written with a leading
    /// `::` is absolute and probes only the top-level interpretation.
    ///
    /// Returns `None` when no candidate path exists — an expected outcome
    /// for references to language built-ins and external dependencies, not
    /// an error.
    #[must_use]
    pub fn resolve(
        &self,
        unresolved: &UnresolvedReference,
        registry: &PackageRegistry,
    ) -> Option<ConstantContext> {
        let name_segments: Vec<&str> = unresolved
            .constant_name
            .split("::")
            .filter(|s| !s.is_empty())
            .collect();
        if name_segments.is_empty() {
            return None;
        }

        let nesting_depths: Vec<usize> = if unresolved.constant_name.starts_with("::") {
            vec![0]
        } else {
            (0..=unresolved.namespace_path.len()).rev().collect()
        };

        for depth in nesting_depths {
            let mut candidate: Vec<&str> = unresolved.namespace_path[..depth]
                .iter()
                .map(String::as_str)
                .collect();
            candidate.extend(&name_segments);

            if let Some(defining_file) = self.probe(&candidate) {
                let public = registry
                    .package_for(&defining_file)
                    .is_some_and(|p| p.public_file(&defining_file));
                return Some(ConstantContext {
                    fully_qualified_name: format!("::{}", candidate.join("::")),
                    defining_file,
                    public,
                });
            }
        }

        None
    }

    /// Probes the filesystem for a candidate constant name, memoized.
    ///
    /// Returns the project-relative path of the defining file, if any load
    /// path contains it.
    fn probe(&self, segments: &[&str]) -> Option<PathBuf> {
        let key = segments.join("::");

        if let Ok(probes) = self.probes.read() {
            if let Some(outcome) = probes.get(&key) {
                return outcome.clone();
            }
        }

        let outcome = self.probe_uncached(segments);
        trace!("probe {key} -> {outcome:?}");
        if let Ok(mut probes) = self.probes.write() {
            probes.insert(key, outcome.clone());
        }
        outcome
    }

    fn probe_uncached(&self, segments: &[&str]) -> Option<PathBuf> {
        let mut relative = PathBuf::new();
        for segment in segments {
            relative.push(self.inflector.underscore(segment));
        }
        relative.set_extension(&self.extension);

        for load_path in &self.load_paths {
            let candidate = load_path.join(&relative);
            if self.root.join(&candidate).is_file() {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::types::SourceLocation;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn resolver(root: &Path) -> ConstantResolver {
        ConstantResolver::new(
            root.to_path_buf(),
            vec![PathBuf::from("app"), PathBuf::from("lib")],
            "rb",
            Inflector::default(),
        )
    }

    fn unresolved(name: &str, nesting: &[&str]) -> UnresolvedReference {
        UnresolvedReference {
            constant_name: name.to_string(),
            namespace_path: nesting.iter().map(ToString::to_string).collect(),
            referencing_file: PathBuf::from("app/main.rb"),
            location: SourceLocation::new(1, 1),
        }
    }

    fn empty_registry() -> PackageRegistry {
        PackageRegistry::new(vec![]).unwrap()
    }

    #[test]
    fn resolves_top_level_constant() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/charge.rb");

        let ctx = resolver(dir.path())
            .resolve(&unresolved("Charge", &[]), &empty_registry())
            .unwrap();
        assert_eq!(ctx.fully_qualified_name, "::Charge");
        assert_eq!(ctx.defining_file, PathBuf::from("app/charge.rb"));
    }

    #[test]
    fn innermost_interpretation_wins() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/billing/charge.rb");
        write_file(dir.path(), "app/charge.rb");

        let ctx = resolver(dir.path())
            .resolve(&unresolved("Charge", &["Billing"]), &empty_registry())
            .unwrap();
        assert_eq!(ctx.fully_qualified_name, "::Billing::Charge");
        assert_eq!(ctx.defining_file, PathBuf::from("app/billing/charge.rb"));
    }

    #[test]
    fn walks_outward_when_inner_candidate_is_missing() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/charge.rb");

        let ctx = resolver(dir.path())
            .resolve(
                &unresolved("Charge", &["Billing", "Invoices"]),
                &empty_registry(),
            )
            .unwrap();
        assert_eq!(ctx.fully_qualified_name, "::Charge");
    }

    #[test]
    fn absolute_reference_skips_nesting() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/billing/charge.rb");
        write_file(dir.path(), "app/charge.rb");

        let ctx = resolver(dir.path())
            .resolve(&unresolved("::Charge", &["Billing"]), &empty_registry())
            .unwrap();
        assert_eq!(ctx.fully_qualified_name, "::Charge");
        assert_eq!(ctx.defining_file, PathBuf::from("app/charge.rb"));
    }

    #[test]
    fn qualified_name_maps_to_nested_path() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/billing/http_client.rb");

        let ctx = resolver(dir.path())
            .resolve(&unresolved("Billing::HTTPClient", &[]), &empty_registry())
            .unwrap();
        assert_eq!(ctx.defining_file, PathBuf::from("app/billing/http_client.rb"));
    }

    #[test]
    fn later_load_paths_are_probed() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "lib/util.rb");

        let ctx = resolver(dir.path())
            .resolve(&unresolved("Util", &[]), &empty_registry())
            .unwrap();
        assert_eq!(ctx.defining_file, PathBuf::from("lib/util.rb"));
    }

    #[test]
    fn unresolvable_when_no_candidate_exists() {
        let dir = TempDir::new().unwrap();
        assert!(resolver(dir.path())
            .resolve(&unresolved("Missing", &["Deeply", "Nested"]), &empty_registry())
            .is_none());
    }

    #[test]
    fn public_when_defining_file_is_under_public_path() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "packs/billing/public/charge.rb");
        write_file(dir.path(), "packs/billing/internal/ledger.rb");

        let registry =
            PackageRegistry::new(vec![Package::new("billing", "packs/billing")]).unwrap();
        let resolver = ConstantResolver::new(
            dir.path().to_path_buf(),
            vec![
                PathBuf::from("packs/billing/public"),
                PathBuf::from("packs/billing/internal"),
            ],
            "rb",
            Inflector::default(),
        );

        let public = resolver.resolve(&unresolved("Charge", &[]), &registry).unwrap();
        assert!(public.public);

        let private = resolver.resolve(&unresolved("Ledger", &[]), &registry).unwrap();
        assert!(!private.public);
    }

    #[test]
    fn probes_are_memoized_per_name() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/charge.rb");
        let resolver = resolver(dir.path());
        let registry = empty_registry();

        let first = resolver.resolve(&unresolved("Charge", &[]), &registry);
        // Deleting the file does not change the answer within the run.
        fs::remove_file(dir.path().join("app/charge.rb")).unwrap();
        let second = resolver.resolve(&unresolved("Charge", &[]), &registry);
        assert_eq!(first, second);
    }
}
