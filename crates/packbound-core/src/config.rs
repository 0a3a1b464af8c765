//! Configuration loading: project settings and package manifests.
//!
//! Reads `packbound.toml` at the project root and discovers one `pack.toml`
//! per package directory. Downstream components consume only the parsed
//! [`Package`] records and the configuration digest, never raw TOML.

use crate::digest;
use crate::inflector::Inflector;
use crate::package::{EnforcePrivacy, Package};
use crate::registry::ConfigurationError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Project-level configuration file name.
pub const ROOT_CONFIG_FILE: &str = "packbound.toml";

/// Per-package manifest file name.
pub const PACKAGE_CONFIG_FILE: &str = "pack.toml";

/// Raw shape of `packbound.toml`.
#[derive(Debug, Deserialize)]
struct RootConfigDto {
    #[serde(default = "default_load_paths")]
    load_paths: Vec<String>,
    #[serde(default = "default_extension")]
    extension: String,
    #[serde(default = "default_exclude")]
    exclude: Vec<String>,
    #[serde(default = "default_true")]
    cache: bool,
    #[serde(default = "default_cache_directory")]
    cache_directory: String,
    #[serde(default)]
    fail_fast: bool,
    #[serde(default)]
    parallelism: Option<usize>,
    #[serde(default)]
    inflections: BTreeMap<String, String>,
}

fn default_load_paths() -> Vec<String> {
    vec!["app".to_string(), "lib".to_string()]
}

fn default_extension() -> String {
    "rb".to_string()
}

fn default_exclude() -> Vec<String> {
    vec!["**/vendor/**".to_string(), "**/tmp/**".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_cache_directory() -> String {
    "tmp/cache/packbound".to_string()
}

/// Raw shape of a `pack.toml` manifest.
#[derive(Debug, Deserialize)]
struct PackageDto {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    enforce_privacy: Option<EnforcePrivacyDto>,
    #[serde(default)]
    enforce_dependencies: bool,
    #[serde(default)]
    public_path: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// `enforce_privacy` accepts `false`, `true`, or a list of fully qualified
/// constant names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnforcePrivacyDto {
    Flag(bool),
    Constants(Vec<String>),
}

impl From<EnforcePrivacyDto> for EnforcePrivacy {
    fn from(dto: EnforcePrivacyDto) -> Self {
        match dto {
            EnforcePrivacyDto::Flag(false) => Self::Off,
            EnforcePrivacyDto::Flag(true) => Self::All,
            EnforcePrivacyDto::Constants(names) => {
                Self::Constants(names.into_iter().collect())
            }
        }
    }
}

/// Validated project configuration.
#[derive(Debug)]
pub struct Configuration {
    /// Absolute project root.
    pub root: PathBuf,
    /// Load paths relative to the root, in probe order.
    pub load_paths: Vec<PathBuf>,
    /// Source file extension, without the leading dot.
    pub extension: String,
    /// Glob patterns excluded from scanning and package discovery.
    pub exclude: Vec<String>,
    /// Whether the extraction cache is enabled.
    pub cache_enabled: bool,
    /// Cache directory relative to the root.
    pub cache_directory: PathBuf,
    /// Stop dispatching new file work after the first parse failure.
    pub fail_fast: bool,
    /// Worker pool size override.
    pub parallelism: Option<usize>,
    /// Per-segment inflection overrides.
    pub inflections: BTreeMap<String, String>,
    /// All discovered packages.
    pub packages: Vec<Package>,
    /// Digest over every configuration file; a change busts the cache.
    pub config_digest: String,
}

impl Configuration {
    /// Loads configuration from `root/packbound.toml` and the package
    /// manifests beneath `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for unreadable or malformed
    /// configuration files.
    pub fn load(root: &Path) -> Result<Self, ConfigurationError> {
        Self::load_from(root, None)
    }

    /// Loads configuration with an explicit project config file path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for unreadable or malformed
    /// configuration files.
    pub fn load_from(root: &Path, config_file: Option<&Path>) -> Result<Self, ConfigurationError> {
        let root = absolutize(root)?;

        let config_path = config_file
            .map_or_else(|| root.join(ROOT_CONFIG_FILE), Path::to_path_buf);
        let root_text = match fs::read_to_string(&config_path) {
            Ok(text) => text,
            Err(_) if config_file.is_none() => String::new(),
            Err(source) => {
                return Err(ConfigurationError::Io {
                    path: config_path,
                    source,
                })
            }
        };
        // An empty document picks up every serde default.
        let dto: RootConfigDto =
            toml::from_str(&root_text).map_err(|e| ConfigurationError::Parse {
                path: config_path.clone(),
                message: e.to_string(),
            })?;

        let exclude = dto.exclude;
        let manifests = discover_manifests(&root, &exclude);
        let mut packages = Vec::with_capacity(manifests.len());
        let mut digest_parts: Vec<Vec<u8>> = vec![root_text.clone().into_bytes()];

        for manifest in &manifests {
            let path = root.join(manifest);
            let text = fs::read_to_string(&path).map_err(|source| ConfigurationError::Io {
                path: path.clone(),
                source,
            })?;
            let package = parse_package(manifest, &text)?;
            debug!("discovered package `{}` at {}", package.name, manifest.display());
            digest_parts.push(manifest.to_string_lossy().into_owned().into_bytes());
            digest_parts.push(text.into_bytes());
            packages.push(package);
        }

        let config_digest =
            digest::hex_digest_parts(digest_parts.iter().map(Vec::as_slice));

        Ok(Self {
            root,
            load_paths: dto.load_paths.into_iter().map(PathBuf::from).collect(),
            extension: dto.extension,
            exclude,
            cache_enabled: dto.cache,
            cache_directory: PathBuf::from(dto.cache_directory),
            fail_fast: dto.fail_fast,
            parallelism: dto.parallelism,
            inflections: dto.inflections,
            packages,
            config_digest,
        })
    }

    /// Whether a project-relative path matches an exclude pattern.
    #[must_use]
    pub fn is_excluded(&self, relative: &Path) -> bool {
        is_excluded(relative, &self.exclude)
    }

    /// Absolute cache directory.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.root.join(&self.cache_directory)
    }

    /// Inflector built from the configured overrides.
    #[must_use]
    pub fn inflector(&self) -> Inflector {
        Inflector::new(self.inflections.clone())
    }
}

fn absolutize(root: &Path) -> Result<PathBuf, ConfigurationError> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(root))
        .map_err(|source| ConfigurationError::Io {
            path: root.to_path_buf(),
            source,
        })
}

fn is_excluded(relative: &Path, patterns: &[String]) -> bool {
    let path_str = relative.to_string_lossy();
    for pattern in patterns {
        if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
            if glob_pattern.matches(&path_str) {
                return true;
            }
        }
        // `dir/**` style patterns also match as component prefixes.
        let needle = pattern.replace("**", "");
        let needle = needle.trim_start_matches('/');
        if !needle.is_empty()
            && (path_str.starts_with(needle) || path_str.contains(&format!("/{needle}")))
        {
            return true;
        }
    }
    false
}

/// Finds all `pack.toml` manifests under the root, sorted by path for a
/// deterministic configuration digest.
fn discover_manifests(root: &Path, exclude: &[String]) -> Vec<PathBuf> {
    let mut manifests: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == PACKAGE_CONFIG_FILE)
        .filter_map(|e| e.path().strip_prefix(root).map(Path::to_path_buf).ok())
        .filter(|relative| !is_excluded(relative, exclude))
        .collect();
    manifests.sort();
    manifests
}

fn parse_package(manifest: &Path, text: &str) -> Result<Package, ConfigurationError> {
    let dto: PackageDto = toml::from_str(text).map_err(|e| ConfigurationError::Parse {
        path: manifest.to_path_buf(),
        message: e.to_string(),
    })?;

    let package_root = manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let name = dto
        .name
        .unwrap_or_else(|| package_root.to_string_lossy().into_owned());

    let mut package = Package::new(name, package_root)
        .with_enforce_dependencies(dto.enforce_dependencies)
        .with_dependencies(dto.dependencies);
    if let Some(mode) = dto.enforce_privacy {
        package = package.with_enforce_privacy(mode.into());
    }
    if let Some(public_path) = dto.public_path {
        package = package.with_public_path(public_path);
    }
    Ok(package)
}
