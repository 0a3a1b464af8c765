//! Reference types at each stage of the pipeline.
//!
//! A file yields [`UnresolvedReference`]s, each of which the resolver turns
//! into a [`ConstantContext`], and the two combine with the package registry
//! into a [`Reference`] ready for checking.

use crate::package::Package;
use crate::types::SourceLocation;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A syntactic constant usage before its defining file is known.
///
/// Value type: two references with identical fields are interchangeable.
/// Serialized into cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// Constant name as written in source (`C`, `A::C`, or `::C`).
    pub constant_name: String,
    /// Namespace nesting enclosing the reference, outermost first.
    pub namespace_path: Vec<String>,
    /// File containing the reference, relative to the project root.
    pub referencing_file: PathBuf,
    /// Position of the reference.
    pub location: SourceLocation,
}

/// Result of resolving a constant name to its defining file.
///
/// Derived per run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantContext {
    /// Fully qualified constant name with a leading `::`.
    pub fully_qualified_name: String,
    /// Defining file, relative to the project root.
    pub defining_file: PathBuf,
    /// Whether the defining file lies under its package's public path.
    pub public: bool,
}

/// A fully resolved reference, ready for the checker pipeline.
///
/// Borrows its packages from the registry; immutable once built.
#[derive(Debug, Clone)]
pub struct Reference<'a> {
    /// File containing the reference, relative to the project root.
    pub referencing_file: PathBuf,
    /// Package owning the referencing file, if tracked.
    pub source_package: Option<&'a Package>,
    /// Package owning the constant's defining file, if tracked.
    pub destination_package: Option<&'a Package>,
    /// Fully qualified constant name with a leading `::`.
    pub constant_name: String,
    /// Position of the reference.
    pub location: SourceLocation,
    /// Whether the constant is part of the destination's public API.
    pub public: bool,
}
