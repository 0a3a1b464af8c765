//! Package definitions: named, directory-rooted units of the codebase.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Privacy enforcement mode declared by a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcePrivacy {
    /// Privacy is not enforced; all constants may be referenced.
    Off,
    /// All non-public constants are enforced.
    All,
    /// Only the listed fully-qualified constants are enforced.
    Constants(BTreeSet<String>),
}

impl EnforcePrivacy {
    /// Whether a fully-qualified constant name falls under enforcement.
    ///
    /// List entries match exactly; a constant whose name merely starts with
    /// an enforced name is not a match.
    #[must_use]
    pub fn enforced_for(&self, fully_qualified_name: &str) -> bool {
        match self {
            Self::Off => false,
            Self::All => true,
            Self::Constants(names) => names.contains(fully_qualified_name),
        }
    }

    /// Returns true if privacy is not enforced at all.
    #[must_use]
    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }
}

/// A named, directory-rooted unit of the codebase with its own
/// boundary-enforcement configuration.
///
/// Immutable for the duration of a run once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package name; defaults to the root directory's relative path.
    pub name: String,
    /// Root directory, relative to the project root.
    pub root: PathBuf,
    /// Privacy enforcement mode.
    pub enforce_privacy: EnforcePrivacy,
    /// Whether references into this package require a declared dependency.
    pub enforce_dependencies: bool,
    /// Directory under the root whose constants form the public API.
    pub public_path: PathBuf,
    /// Names of packages this package declares a dependency on.
    pub dependencies: BTreeSet<String>,
}

impl Package {
    /// Default public API directory within a package.
    pub const DEFAULT_PUBLIC_PATH: &'static str = "public";

    /// Creates a package with no enforcement and the default public path.
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            enforce_privacy: EnforcePrivacy::Off,
            enforce_dependencies: false,
            public_path: PathBuf::from(Self::DEFAULT_PUBLIC_PATH),
            dependencies: BTreeSet::new(),
        }
    }

    /// Sets the privacy enforcement mode.
    #[must_use]
    pub fn with_enforce_privacy(mut self, mode: EnforcePrivacy) -> Self {
        self.enforce_privacy = mode;
        self
    }

    /// Enables dependency enforcement.
    #[must_use]
    pub fn with_enforce_dependencies(mut self, enforce: bool) -> Self {
        self.enforce_dependencies = enforce;
        self
    }

    /// Sets the public API directory.
    #[must_use]
    pub fn with_public_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_path = path.into();
        self
    }

    /// Adds declared dependencies.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether this package declares a dependency on `other`.
    #[must_use]
    pub fn depends_on(&self, other: &str) -> bool {
        self.dependencies.contains(other)
    }

    /// Whether a project-relative file path lies inside this package.
    #[must_use]
    pub fn contains(&self, file: &Path) -> bool {
        self.root == Path::new(".") || file.starts_with(&self.root)
    }

    /// Whether a project-relative file path lies under this package's
    /// public API directory.
    #[must_use]
    pub fn public_file(&self, file: &Path) -> bool {
        let public_root = if self.root == Path::new(".") {
            self.public_path.clone()
        } else {
            self.root.join(&self.public_path)
        };
        file.starts_with(public_root)
    }
}
