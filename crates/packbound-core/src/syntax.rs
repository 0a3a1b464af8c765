//! Language-agnostic syntax tree IR and the parser collaborator trait.
//!
//! [`Parser`] is the extension point for adding new source languages.
//! A frontend lowers its language's concrete syntax into [`SyntaxTree`]:
//! namespace scopes (module/class bodies) and the constant references that
//! occur inside them. The core never tokenizes source text itself.

use crate::types::SourceLocation;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One node of the lowered syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A namespace scope (module or class body).
    Namespace {
        /// Name as written; may be compound (`A::B`) or absolute (`::A`).
        name: String,
        /// Position of the definition.
        location: SourceLocation,
        /// Nodes lowered from the scope body.
        children: Vec<Node>,
    },
    /// A constant reference as written in source.
    ConstantRef {
        /// Name as written; may be relative (`C`, `A::C`) or absolute (`::C`).
        name: String,
        /// Position of the reference.
        location: SourceLocation,
    },
}

impl Node {
    /// Creates a namespace node.
    #[must_use]
    pub fn namespace(
        name: impl Into<String>,
        location: SourceLocation,
        children: Vec<Node>,
    ) -> Self {
        Self::Namespace {
            name: name.into(),
            location,
            children,
        }
    }

    /// Creates a constant reference node.
    #[must_use]
    pub fn constant(name: impl Into<String>, location: SourceLocation) -> Self {
        Self::ConstantRef {
            name: name.into(),
            location,
        }
    }
}

/// Parsed representation of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxTree {
    /// Top-level nodes of the file.
    pub nodes: Vec<Node>,
}

impl SyntaxTree {
    /// Creates a tree from top-level nodes.
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }
}

/// A file that could not be turned into a [`SyntaxTree`].
///
/// Surfaced as a per-file failure; never aborts the whole run.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The file could not be read.
    #[error("failed to read {path}: {message}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// IO error message.
        message: String,
    },

    /// The file's source failed to parse.
    #[error("syntax error in {path}: {message}")]
    Syntax {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },
}

impl ParseError {
    /// The file the error is tied to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Syntax { path, .. } => path,
        }
    }
}

/// Parser collaborator: turns a source file into a [`SyntaxTree`].
///
/// Implementations are language-specific and live outside the core.
pub trait Parser: Send + Sync {
    /// Parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the file cannot be read or parsed.
    fn parse(&self, path: &Path) -> Result<SyntaxTree, ParseError>;
}
