//! Run orchestration: drives files through extraction, resolution, and
//! checking, and aggregates the codebase-wide result.

use crate::baseline::{BaselineError, BaselineGroups, BaselineRecord, BaselineStore, PackageKey};
use crate::cache::Cache;
use crate::checkers::{default_checkers, CheckerBox, ReferenceChecker};
use crate::extractor;
use crate::reference::{Reference, UnresolvedReference};
use crate::registry::PackageRegistry;
use crate::resolver::ConstantResolver;
use crate::syntax::{ParseError, Parser};
use crate::types::{ParseFailure, RunResult};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by the orchestrator itself.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The builder was missing a required component.
    #[error("runner is missing required component `{component}`")]
    Incomplete {
        /// Name of the missing component.
        component: &'static str,
    },

    /// Persisting the baseline failed.
    #[error(transparent)]
    Baseline(#[from] BaselineError),
}

/// Builder for configuring a [`Runner`].
#[derive(Default)]
pub struct RunnerBuilder {
    root: Option<PathBuf>,
    registry: Option<Arc<PackageRegistry>>,
    parser: Option<Arc<dyn Parser>>,
    resolver: Option<Arc<ConstantResolver>>,
    cache: Option<Cache>,
    checkers: Vec<CheckerBox>,
    baseline: Option<Arc<dyn BaselineStore>>,
    fail_fast: bool,
    parallelism: Option<usize>,
}

impl RunnerBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absolute project root.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sets the package registry.
    #[must_use]
    pub fn registry(mut self, registry: Arc<PackageRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the parser collaborator.
    #[must_use]
    pub fn parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Sets the constant resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<ConstantResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Enables the extraction cache.
    #[must_use]
    pub fn cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Appends a checker to the pipeline.
    #[must_use]
    pub fn checker(mut self, checker: CheckerBox) -> Self {
        self.checkers.push(checker);
        self
    }

    /// Sets the baseline store.
    #[must_use]
    pub fn baseline(mut self, baseline: Arc<dyn BaselineStore>) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Stops dispatching new file work after the first parse failure.
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Overrides the worker pool size.
    #[must_use]
    pub fn parallelism(mut self, workers: Option<usize>) -> Self {
        self.parallelism = workers;
        self
    }

    /// Builds the runner.
    ///
    /// Without explicit checkers the built-in set (privacy, dependency) is
    /// used; without a baseline, nothing is considered accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Incomplete`] when root, registry, parser, or
    /// resolver are missing.
    pub fn build(self) -> Result<Runner, RunnerError> {
        let root = self
            .root
            .ok_or(RunnerError::Incomplete { component: "root" })?;
        let registry = self.registry.ok_or(RunnerError::Incomplete {
            component: "registry",
        })?;
        let parser = self.parser.ok_or(RunnerError::Incomplete {
            component: "parser",
        })?;
        let resolver = self.resolver.ok_or(RunnerError::Incomplete {
            component: "resolver",
        })?;

        let checkers = if self.checkers.is_empty() {
            default_checkers()
        } else {
            self.checkers
        };
        let baseline = self
            .baseline
            .unwrap_or_else(|| Arc::new(crate::baseline::InMemoryBaseline::new()));

        Ok(Runner {
            root,
            registry,
            parser,
            resolver,
            cache: self.cache,
            pipeline: ReferenceChecker::new(checkers),
            baseline,
            fail_fast: self.fail_fast,
            parallelism: self.parallelism,
        })
    }
}

/// Orchestrates a run over a file set.
///
/// Per-file work is embarrassingly parallel and distributed across a worker
/// pool; aggregation happens on the calling thread afterwards.
pub struct Runner {
    root: PathBuf,
    registry: Arc<PackageRegistry>,
    parser: Arc<dyn Parser>,
    resolver: Arc<ConstantResolver>,
    cache: Option<Cache>,
    pipeline: ReferenceChecker,
    baseline: Arc<dyn BaselineStore>,
    fail_fast: bool,
    parallelism: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Check,
    Update,
}

#[derive(Default)]
struct FileOutcome {
    offenses: Vec<crate::types::Offense>,
    records: Vec<(PackageKey, BaselineRecord)>,
    failure: Option<ParseFailure>,
    processed: bool,
}

impl Runner {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    /// Checks a file set, reporting offenses not accepted in the baseline.
    ///
    /// File paths are relative to the project root. Parse failures are
    /// collected per file and never abort the run.
    #[must_use]
    pub fn check(&self, files: &[PathBuf]) -> RunResult {
        info!("checking {} file(s)", files.len());
        let outcomes = self.process_all(files, Mode::Check);

        let mut result = RunResult::new();
        for outcome in outcomes {
            result.offenses.extend(outcome.offenses);
            result.parse_failures.extend(outcome.failure);
            result.files_checked += usize::from(outcome.processed);
        }
        result.sort();

        info!(
            "found {} offense(s) and {} parse failure(s) in {} file(s)",
            result.offenses.len(),
            result.parse_failures.len(),
            result.files_checked
        );
        result
    }

    /// Recomputes the full violation set and persists it as the new
    /// accepted baseline, overwriting the previous one.
    ///
    /// Running this twice on an unchanged codebase is idempotent. The
    /// returned result carries only violations that could not be recorded
    /// (references from untracked files) plus any parse failures.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Baseline`] when persisting fails.
    pub fn update_baseline(&self, files: &[PathBuf]) -> Result<RunResult, RunnerError> {
        info!("updating baseline from {} file(s)", files.len());
        let outcomes = self.process_all(files, Mode::Update);

        // Every tracked package gets a group so stale baselines are cleared.
        let mut groups: BaselineGroups = self
            .registry
            .all_packages()
            .map(|p| {
                (
                    PackageKey {
                        name: p.name.clone(),
                        root: p.root.clone(),
                    },
                    Vec::new(),
                )
            })
            .collect();

        let mut result = RunResult::new();
        let mut recorded = 0usize;
        for outcome in outcomes {
            result.offenses.extend(outcome.offenses);
            result.parse_failures.extend(outcome.failure);
            result.files_checked += usize::from(outcome.processed);
            for (key, record) in outcome.records {
                groups.entry(key).or_default().push(record);
                recorded += 1;
            }
        }
        result.sort();

        self.baseline.record(&groups)?;
        info!("recorded {recorded} accepted violation(s)");
        Ok(result)
    }

    fn process_all(&self, files: &[PathBuf], mode: Mode) -> Vec<FileOutcome> {
        let stop = AtomicBool::new(false);
        let work = || {
            files
                .par_iter()
                .map(|file| self.process_file(file, mode, &stop))
                .collect()
        };

        match self.parallelism {
            Some(workers) => match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(work),
                Err(e) => {
                    warn!("failed to build worker pool ({e}), using default");
                    work()
                }
            },
            None => work(),
        }
    }

    /// Processes one file as an atomic unit of work.
    ///
    /// Cancellation is cooperative: the stop flag is consulted only between
    /// files, never mid-file.
    fn process_file(&self, file: &Path, mode: Mode, stop: &AtomicBool) -> FileOutcome {
        let mut outcome = FileOutcome::default();
        if stop.load(Ordering::SeqCst) {
            debug!("skipping {} after cancellation", file.display());
            return outcome;
        }

        let absolute = self.root.join(file);
        let references = match &self.cache {
            Some(cache) => {
                cache.fetch_or_compute(&absolute, || self.extract(file, &absolute))
            }
            None => self.extract(file, &absolute),
        };
        let references = match references {
            Ok(references) => references,
            Err(e) => {
                warn!("failed to parse {}: {e}", file.display());
                if self.fail_fast {
                    stop.store(true, Ordering::SeqCst);
                }
                outcome.failure = Some(ParseFailure {
                    file: file.to_path_buf(),
                    message: e.to_string(),
                });
                return outcome;
            }
        };
        outcome.processed = true;
        let source_package = self.registry.package_for(file);

        for unresolved in &references {
            let Some(context) = self.resolver.resolve(unresolved, &self.registry) else {
                // References to built-ins and external dependencies resolve
                // to nothing; they are expected and dropped.
                continue;
            };
            let reference = Reference {
                referencing_file: file.to_path_buf(),
                source_package,
                destination_package: self.registry.package_for(&context.defining_file),
                constant_name: context.fully_qualified_name,
                location: unresolved.location,
                public: context.public,
            };

            match mode {
                Mode::Check => outcome
                    .offenses
                    .extend(self.pipeline.call(&reference, self.baseline.as_ref())),
                Mode::Update => {
                    for offense in self.pipeline.all_violations(&reference) {
                        match (reference.source_package, reference.destination_package) {
                            (Some(source), Some(destination)) => outcome.records.push((
                                PackageKey {
                                    name: source.name.clone(),
                                    root: source.root.clone(),
                                },
                                BaselineRecord {
                                    destination_package: destination.name.clone(),
                                    constant_name: reference.constant_name.clone(),
                                    file: file.to_path_buf(),
                                    violation_type: offense.violation_type,
                                },
                            )),
                            // Violations from untracked files have no home
                            // baseline; they stay visible.
                            _ => outcome.offenses.push(offense),
                        }
                    }
                }
            }
        }

        outcome
    }

    fn extract(
        &self,
        relative: &Path,
        absolute: &Path,
    ) -> Result<Vec<UnresolvedReference>, ParseError> {
        let tree = self.parser.parse(absolute)?;
        Ok(extractor::extract(relative, &tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflector::Inflector;
    use crate::syntax::{Node, SyntaxTree};
    use crate::types::SourceLocation;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Parser fake serving pre-built trees by absolute path.
    struct FakeParser {
        trees: HashMap<PathBuf, SyntaxTree>,
    }

    impl Parser for FakeParser {
        fn parse(&self, path: &Path) -> Result<SyntaxTree, ParseError> {
            self.trees.get(path).cloned().ok_or_else(|| ParseError::Syntax {
                path: path.to_path_buf(),
                message: "unexpected token".to_string(),
            })
        }
    }

    fn write_file(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "contents").unwrap();
    }

    fn runner_for(dir: &TempDir, parser: FakeParser) -> Runner {
        let registry = Arc::new(PackageRegistry::new(vec![]).unwrap());
        let resolver = Arc::new(ConstantResolver::new(
            dir.path().to_path_buf(),
            vec![PathBuf::from("app")],
            "rb",
            Inflector::default(),
        ));
        Runner::builder()
            .root(dir.path())
            .registry(registry)
            .parser(Arc::new(parser))
            .resolver(resolver)
            .parallelism(Some(1))
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_core_components() {
        let result = Runner::builder().build();
        assert!(matches!(
            result,
            Err(RunnerError::Incomplete { component: "root" })
        ));
    }

    #[test]
    fn parse_failure_is_contained_to_its_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/good.rb");
        write_file(dir.path(), "app/bad.rb");

        let mut trees = HashMap::new();
        trees.insert(
            dir.path().join("app/good.rb"),
            SyntaxTree::new(vec![Node::constant("Unknown", SourceLocation::new(1, 1))]),
        );
        let runner = runner_for(&dir, FakeParser { trees });

        let result = runner.check(&[PathBuf::from("app/bad.rb"), PathBuf::from("app/good.rb")]);
        assert_eq!(result.parse_failures.len(), 1);
        assert_eq!(result.parse_failures[0].file, PathBuf::from("app/bad.rb"));
        assert_eq!(result.files_checked, 1);
        assert!(!result.is_success());
    }

    #[test]
    fn fail_fast_stops_dispatching_new_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/bad.rb");
        write_file(dir.path(), "app/later.rb");

        let mut trees = HashMap::new();
        trees.insert(dir.path().join("app/later.rb"), SyntaxTree::default());
        let registry = Arc::new(PackageRegistry::new(vec![]).unwrap());
        let resolver = Arc::new(ConstantResolver::new(
            dir.path().to_path_buf(),
            vec![PathBuf::from("app")],
            "rb",
            Inflector::default(),
        ));
        let runner = Runner::builder()
            .root(dir.path())
            .registry(registry)
            .parser(Arc::new(FakeParser { trees }))
            .resolver(resolver)
            .fail_fast(true)
            .parallelism(Some(1))
            .build()
            .unwrap();

        let result = runner.check(&[PathBuf::from("app/bad.rb"), PathBuf::from("app/later.rb")]);
        assert_eq!(result.parse_failures.len(), 1);
        // The second file was never dispatched.
        assert_eq!(result.files_checked, 0);
    }

    #[test]
    fn unresolvable_references_produce_no_offenses() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app/main.rb");

        let mut trees = HashMap::new();
        trees.insert(
            dir.path().join("app/main.rb"),
            SyntaxTree::new(vec![Node::constant(
                "MyConstant",
                SourceLocation::new(5, 5),
            )]),
        );
        let runner = runner_for(&dir, FakeParser { trees });

        let result = runner.check(&[PathBuf::from("app/main.rb")]);
        assert!(result.offenses.is_empty());
        assert!(result.is_success());
        assert_eq!(result.files_checked, 1);
    }
}
