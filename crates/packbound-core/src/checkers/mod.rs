//! Boundary checkers and the reference-checking pipeline.
//!
//! Checkers are independent, stateless rule evaluators. The pipeline runs
//! them in the configured order against one resolved reference; order
//! affects only the ordering of the resulting offenses, never which
//! offenses exist.

mod dependency;
mod privacy;

pub use dependency::DependencyChecker;
pub use privacy::PrivacyChecker;

use crate::baseline::BaselineStore;
use crate::reference::Reference;
use crate::types::{Offense, ViolationType};

/// A boundary rule evaluated against one resolved reference.
pub trait Checker: Send + Sync {
    /// The kind of violation this checker reports.
    fn violation_type(&self) -> ViolationType;

    /// Whether the reference violates this checker's rule.
    fn invalid_reference(&self, reference: &Reference<'_>) -> bool;

    /// Human-readable violation message for an invalid reference.
    fn message(&self, reference: &Reference<'_>) -> String;
}

/// Type alias for boxed checker trait objects.
pub type CheckerBox = Box<dyn Checker>;

/// The built-in checker set in its default order.
#[must_use]
pub fn default_checkers() -> Vec<CheckerBox> {
    vec![Box::new(PrivacyChecker), Box::new(DependencyChecker)]
}

/// Runs an ordered checker list against resolved references.
pub struct ReferenceChecker {
    checkers: Vec<CheckerBox>,
}

impl ReferenceChecker {
    /// Creates a pipeline over an ordered checker list.
    #[must_use]
    pub fn new(checkers: Vec<CheckerBox>) -> Self {
        Self { checkers }
    }

    /// Collects offenses for a reference, skipping violations already
    /// accepted in the baseline.
    ///
    /// The baseline is consulted only for references a checker has already
    /// found invalid, never for valid ones.
    #[must_use]
    pub fn call(&self, reference: &Reference<'_>, baseline: &dyn BaselineStore) -> Vec<Offense> {
        self.checkers
            .iter()
            .filter(|checker| checker.invalid_reference(reference))
            .filter(|checker| !baseline.listed(reference, checker.violation_type()))
            .map(|checker| Self::offense(checker.as_ref(), reference))
            .collect()
    }

    /// Collects every violation for a reference, ignoring the baseline.
    ///
    /// Used when recomputing the full violation set for a baseline update.
    #[must_use]
    pub fn all_violations(&self, reference: &Reference<'_>) -> Vec<Offense> {
        self.checkers
            .iter()
            .filter(|checker| checker.invalid_reference(reference))
            .map(|checker| Self::offense(checker.as_ref(), reference))
            .collect()
    }

    fn offense(checker: &dyn Checker, reference: &Reference<'_>) -> Offense {
        Offense {
            file: reference.referencing_file.clone(),
            location: reference.location,
            violation_type: checker.violation_type(),
            message: checker.message(reference),
        }
    }
}
