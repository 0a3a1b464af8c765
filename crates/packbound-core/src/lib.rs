//! # packbound-core
//!
//! Core engine for enforcing modular boundaries between the packages of a
//! large codebase. It scans source files, extracts references to namespaced
//! constants, resolves each reference to the package defining the target
//! constant, and reports references that violate declared privacy or
//! dependency rules. It includes:
//!
//! - [`PackageRegistry`] for indexing packages and owning-package lookup
//! - [`extract`] for pulling unresolved references out of a parsed file
//! - [`ConstantResolver`] for namespace-to-path resolution
//! - [`Cache`] for skipping re-extraction of unchanged files
//! - [`Checker`] implementations and the [`ReferenceChecker`] pipeline
//! - [`Runner`] for orchestrating whole-codebase runs
//!
//! ## Example
//!
//! ```ignore
//! use packbound_core::{Configuration, PackageRegistry, Runner};
//!
//! let config = Configuration::load(project_root)?;
//! let registry = Arc::new(PackageRegistry::new(config.packages.clone())?);
//! let runner = Runner::builder()
//!     .root(config.root.clone())
//!     .registry(registry)
//!     .parser(parser)
//!     .resolver(resolver)
//!     .build()?;
//! let result = runner.check(&files);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod baseline;
mod cache;
mod checkers;
mod config;
mod digest;
mod extractor;
mod inflector;
mod package;
mod reference;
mod registry;
mod resolver;
mod runner;
mod syntax;
mod types;

pub use baseline::{
    BaselineError, BaselineGroups, BaselineRecord, BaselineStore, DiskBaseline, InMemoryBaseline,
    PackageKey, BASELINE_FILE,
};
pub use cache::{Cache, CacheContents, CACHE_FORMAT_VERSION};
pub use checkers::{
    default_checkers, Checker, CheckerBox, DependencyChecker, PrivacyChecker, ReferenceChecker,
};
pub use config::{Configuration, PACKAGE_CONFIG_FILE, ROOT_CONFIG_FILE};
pub use extractor::extract;
pub use inflector::Inflector;
pub use package::{EnforcePrivacy, Package};
pub use reference::{ConstantContext, Reference, UnresolvedReference};
pub use registry::{ConfigurationError, PackageRegistry};
pub use resolver::ConstantResolver;
pub use runner::{Runner, RunnerBuilder, RunnerError};
pub use syntax::{Node, ParseError, Parser, SyntaxTree};
pub use types::{Offense, ParseFailure, RunResult, SourceLocation, ViolationType};
