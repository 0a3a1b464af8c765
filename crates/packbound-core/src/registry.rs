//! Package registry: indexes packages and maps files to their owning package.

use crate::package::Package;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// All variants are fatal and abort a run before any file work begins.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// IO error reading a configuration file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Two packages declare the same or nested root directories.
    #[error("package roots overlap: `{first}` and `{second}`")]
    OverlappingRoots {
        /// Name of the first package.
        first: String,
        /// Name of the second package.
        second: String,
    },

    /// Two packages declare the same name.
    #[error("duplicate package name `{name}`")]
    DuplicatePackageName {
        /// The duplicated name.
        name: String,
    },

    /// A package declares a dependency on an unknown package.
    #[error("package `{package}` declares a dependency on unknown package `{dependency}`")]
    UnknownDependency {
        /// The declaring package.
        package: String,
        /// The unknown dependency name.
        dependency: String,
    },
}

/// Read-only index of all packages in a codebase.
///
/// Built once per run from already-parsed [`Package`] records and safe to
/// share across concurrent resolution work without locking.
#[derive(Debug)]
pub struct PackageRegistry {
    /// Packages sorted by root depth, deepest first, so that the first
    /// containment hit is the longest prefix match.
    packages: Vec<Package>,
}

impl PackageRegistry {
    /// Builds a registry, validating the package set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when two packages share a name, when
    /// two roots overlap (equal, or one a path-prefix of the other), or when
    /// a declared dependency names no known package.
    pub fn new(mut packages: Vec<Package>) -> Result<Self, ConfigurationError> {
        for (i, a) in packages.iter().enumerate() {
            for b in &packages[i + 1..] {
                if a.name == b.name {
                    return Err(ConfigurationError::DuplicatePackageName {
                        name: a.name.clone(),
                    });
                }
                if roots_overlap(&a.root, &b.root) {
                    return Err(ConfigurationError::OverlappingRoots {
                        first: a.name.clone(),
                        second: b.name.clone(),
                    });
                }
            }
        }

        for package in &packages {
            for dependency in &package.dependencies {
                if !packages.iter().any(|p| &p.name == dependency) {
                    return Err(ConfigurationError::UnknownDependency {
                        package: package.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        packages.sort_by(|a, b| {
            b.root
                .components()
                .count()
                .cmp(&a.root.components().count())
                .then_with(|| a.root.cmp(&b.root))
        });

        Ok(Self { packages })
    }

    /// Discovers package manifests under `root` and builds a registry.
    ///
    /// Convenience over [`crate::Configuration::load`] followed by
    /// [`PackageRegistry::new`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for unreadable or malformed
    /// configuration, and for the validation failures of
    /// [`PackageRegistry::new`].
    pub fn load(root: &Path) -> Result<Self, ConfigurationError> {
        let configuration = crate::config::Configuration::load(root)?;
        Self::new(configuration.packages)
    }

    /// Returns the package owning a project-relative file path.
    ///
    /// The owner is the package with the longest root prefix matching the
    /// path; `None` means the file is untracked.
    #[must_use]
    pub fn package_for(&self, file: &Path) -> Option<&Package> {
        self.packages.iter().find(|p| p.contains(file))
    }

    /// Returns a package by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Iterates over all packages.
    pub fn all_packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    /// Number of registered packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns true if no packages are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Two roots overlap when they are equal or one is a path-prefix of the
/// other. A `.` root overlaps every other root.
fn roots_overlap(a: &Path, b: &Path) -> bool {
    if a == Path::new(".") || b == Path::new(".") {
        return true;
    }
    a.starts_with(b) || b.starts_with(a)
}
