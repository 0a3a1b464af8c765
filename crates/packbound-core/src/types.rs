//! Core types for boundary offenses and run results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Position of a reference within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl SourceLocation {
    /// Creates a new location.
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Kind of boundary violation a checker reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViolationType {
    /// Reference to a constant that is private to its package.
    Privacy,
    /// Reference into a package that the source package does not declare.
    Dependency,
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Privacy => write!(f, "privacy"),
            Self::Dependency => write!(f, "dependency"),
        }
    }
}

/// A boundary violation found during a run.
///
/// Terminal artifact of the pipeline; aggregated into [`RunResult`] and
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offense {
    /// File containing the offending reference, relative to the project root.
    pub file: PathBuf,
    /// Position of the reference.
    pub location: SourceLocation,
    /// Which rule was violated.
    pub violation_type: ViolationType,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for Offense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.file.display(),
            self.location,
            self.message
        )
    }
}

/// A file that could not be parsed during a run.
///
/// Parse failures are collected per file and never abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    /// File that failed to parse, relative to the project root.
    pub file: PathBuf,
    /// Parser error message.
    pub message: String,
}

/// Aggregated outcome of a run over a file set.
#[derive(Debug, Default, Serialize)]
pub struct RunResult {
    /// All offenses found, sorted by file, line, and column.
    pub offenses: Vec<Offense>,
    /// Files that failed to parse.
    pub parse_failures: Vec<ParseFailure>,
    /// Number of files successfully processed.
    pub files_checked: usize,
}

impl RunResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the run found no offenses and no parse failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.offenses.is_empty() && self.parse_failures.is_empty()
    }

    /// Counts offenses of a given violation type.
    #[must_use]
    pub fn count_of(&self, violation_type: ViolationType) -> usize {
        self.offenses
            .iter()
            .filter(|o| o.violation_type == violation_type)
            .count()
    }

    /// Sorts offenses by file, then line, then column, then violation type.
    ///
    /// Called once by the orchestrator so that output is deterministic
    /// regardless of how files were distributed across workers.
    pub fn sort(&mut self) {
        self.offenses.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.location.cmp(&b.location))
                .then(a.violation_type.cmp(&b.violation_type))
        });
        self.parse_failures.sort_by(|a, b| a.file.cmp(&b.file));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_offense(file: &str, line: usize, violation_type: ViolationType) -> Offense {
        Offense {
            file: PathBuf::from(file),
            location: SourceLocation::new(line, 1),
            violation_type,
            message: "boundary crossed".to_string(),
        }
    }

    #[test]
    fn empty_result_is_success() {
        assert!(RunResult::new().is_success());
    }

    #[test]
    fn parse_failure_fails_run() {
        let mut result = RunResult::new();
        result.parse_failures.push(ParseFailure {
            file: PathBuf::from("a.rb"),
            message: "unexpected token".to_string(),
        });
        assert!(!result.is_success());
    }

    #[test]
    fn count_of_filters_by_type() {
        let mut result = RunResult::new();
        result
            .offenses
            .push(make_offense("a.rb", 1, ViolationType::Privacy));
        result
            .offenses
            .push(make_offense("a.rb", 2, ViolationType::Dependency));
        result
            .offenses
            .push(make_offense("b.rb", 1, ViolationType::Privacy));

        assert_eq!(result.count_of(ViolationType::Privacy), 2);
        assert_eq!(result.count_of(ViolationType::Dependency), 1);
    }

    #[test]
    fn sort_orders_by_file_then_location() {
        let mut result = RunResult::new();
        result
            .offenses
            .push(make_offense("b.rb", 1, ViolationType::Privacy));
        result
            .offenses
            .push(make_offense("a.rb", 9, ViolationType::Privacy));
        result
            .offenses
            .push(make_offense("a.rb", 2, ViolationType::Privacy));
        result.sort();

        let order: Vec<(String, usize)> = result
            .offenses
            .iter()
            .map(|o| (o.file.display().to_string(), o.location.line))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.rb".to_string(), 2),
                ("a.rb".to_string(), 9),
                ("b.rb".to_string(), 1)
            ]
        );
    }

    #[test]
    fn violation_type_serializes_lowercase() {
        let json = serde_json::to_string(&ViolationType::Privacy).unwrap();
        assert_eq!(json, "\"privacy\"");
    }
}
