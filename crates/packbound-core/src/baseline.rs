//! Accepted-violation baselines.
//!
//! A baseline records pre-existing boundary violations so they are excluded
//! from new-offense reporting while teams work them off. The store is passed
//! explicitly into the checker pipeline (never ambient state) so tests can
//! substitute an in-memory fake.

use crate::reference::Reference;
use crate::types::ViolationType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// File name of a package's baseline, relative to its root.
pub const BASELINE_FILE: &str = "baseline.toml";

/// Header prepended to every generated baseline file.
const BASELINE_HEADER: &str = "\
# Accepted boundary violations for this package.
# Entries here are excluded from new-offense reporting.
# Regenerate with `packbound update-baseline`.
";

/// Identity of a source package, used to group recorded violations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PackageKey {
    /// Package name.
    pub name: String,
    /// Package root, relative to the project root.
    pub root: PathBuf,
}

/// One violation to record in a baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRecord {
    /// Name of the package owning the referenced constant.
    pub destination_package: String,
    /// Fully qualified constant name.
    pub constant_name: String,
    /// Referencing file, relative to the project root.
    pub file: PathBuf,
    /// Kind of violation.
    pub violation_type: ViolationType,
}

/// Recorded violations grouped by source package.
///
/// Packages mapped to an empty list have their baseline cleared.
pub type BaselineGroups = BTreeMap<PackageKey, Vec<BaselineRecord>>;

/// Errors while persisting a baseline.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// IO error writing a baseline file.
    #[error("failed to write baseline {path}: {source}")]
    Io {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("failed to serialize baseline for `{package}`: {message}")]
    Serialize {
        /// The source package being serialized.
        package: String,
        /// Error message.
        message: String,
    },
}

/// Store of accepted violations.
pub trait BaselineStore: Send + Sync {
    /// Whether a violation of `violation_type` for this exact reference
    /// (constant and referencing file) is already accepted.
    fn listed(&self, reference: &Reference<'_>, violation_type: ViolationType) -> bool;

    /// Replaces the accepted baseline with the given grouping.
    ///
    /// # Errors
    ///
    /// Returns [`BaselineError`] when persistence fails.
    fn record(&self, groups: &BaselineGroups) -> Result<(), BaselineError>;
}

/// Per-entry payload in a baseline file: which violation kinds are accepted
/// for a constant, and from which files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct BaselineEntry {
    violations: BTreeSet<ViolationType>,
    files: BTreeSet<String>,
}

/// destination package name → fully qualified constant → entry.
type BaselineFileModel = BTreeMap<String, BTreeMap<String, BaselineEntry>>;

/// Disk-backed baseline store: one `baseline.toml` per source package,
/// written with deterministic (BTreeMap) ordering so repeated updates on an
/// unchanged codebase are byte-stable.
#[derive(Debug)]
pub struct DiskBaseline {
    /// Absolute project root.
    root: PathBuf,
    /// Lazily loaded baseline files, keyed by package root.
    loaded: RwLock<HashMap<PathBuf, BaselineFileModel>>,
}

impl DiskBaseline {
    /// Creates a store rooted at the absolute project root.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    fn baseline_path(&self, package_root: &Path) -> PathBuf {
        self.root.join(package_root).join(BASELINE_FILE)
    }

    /// Loads (and memoizes) the baseline file for a package root.
    ///
    /// Unreadable or malformed files degrade to an empty baseline.
    fn model_for(&self, package_root: &Path) -> BaselineFileModel {
        if let Ok(loaded) = self.loaded.read() {
            if let Some(model) = loaded.get(package_root) {
                return model.clone();
            }
        }

        let path = self.baseline_path(package_root);
        let model = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<BaselineFileModel>(&contents) {
                Ok(model) => model,
                Err(e) => {
                    tracing::warn!("ignoring malformed baseline {}: {e}", path.display());
                    BaselineFileModel::default()
                }
            },
            Err(_) => BaselineFileModel::default(),
        };

        if let Ok(mut loaded) = self.loaded.write() {
            loaded.insert(package_root.to_path_buf(), model.clone());
        }
        model
    }

    fn render(model: &BaselineFileModel, package: &str) -> Result<String, BaselineError> {
        let body = toml::to_string(model).map_err(|e| BaselineError::Serialize {
            package: package.to_string(),
            message: e.to_string(),
        })?;
        Ok(format!("{BASELINE_HEADER}\n{body}"))
    }
}

impl BaselineStore for DiskBaseline {
    fn listed(&self, reference: &Reference<'_>, violation_type: ViolationType) -> bool {
        let Some(source) = reference.source_package else {
            return false;
        };
        let Some(destination) = reference.destination_package else {
            return false;
        };

        let model = self.model_for(&source.root);
        model
            .get(&destination.name)
            .and_then(|constants| constants.get(&reference.constant_name))
            .is_some_and(|entry| {
                entry.violations.contains(&violation_type)
                    && entry
                        .files
                        .contains(reference.referencing_file.to_string_lossy().as_ref())
            })
    }

    fn record(&self, groups: &BaselineGroups) -> Result<(), BaselineError> {
        for (key, records) in groups {
            let path = self.baseline_path(&key.root);

            if records.is_empty() {
                let _ = fs::remove_file(&path);
                continue;
            }

            let mut model = BaselineFileModel::new();
            for record in records {
                let entry = model
                    .entry(record.destination_package.clone())
                    .or_default()
                    .entry(record.constant_name.clone())
                    .or_default();
                entry.violations.insert(record.violation_type);
                entry.files.insert(record.file.to_string_lossy().into_owned());
            }

            let rendered = Self::render(&model, &key.name)?;
            fs::write(&path, rendered).map_err(|source| BaselineError::Io {
                path: path.clone(),
                source,
            })?;
        }

        if let Ok(mut loaded) = self.loaded.write() {
            loaded.clear();
        }
        Ok(())
    }
}

/// In-memory baseline store for tests and for runs without a baseline.
#[derive(Debug, Default)]
pub struct InMemoryBaseline {
    entries: RwLock<BTreeSet<(String, String, String, ViolationType)>>,
}

impl InMemoryBaseline {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with accepted violations, each given as
    /// `(source package, constant, referencing file, violation type)`.
    #[must_use]
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String, String, ViolationType)>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

impl BaselineStore for InMemoryBaseline {
    fn listed(&self, reference: &Reference<'_>, violation_type: ViolationType) -> bool {
        let Some(source) = reference.source_package else {
            return false;
        };
        self.entries.read().is_ok_and(|entries| {
            entries.contains(&(
                source.name.clone(),
                reference.constant_name.clone(),
                reference.referencing_file.to_string_lossy().into_owned(),
                violation_type,
            ))
        })
    }

    fn record(&self, groups: &BaselineGroups) -> Result<(), BaselineError> {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
            for (key, records) in groups {
                for record in records {
                    entries.insert((
                        key.name.clone(),
                        record.constant_name.clone(),
                        record.file.to_string_lossy().into_owned(),
                        record.violation_type,
                    ));
                }
            }
        }
        Ok(())
    }
}
