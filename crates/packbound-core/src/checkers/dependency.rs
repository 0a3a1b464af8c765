//! Dependency checker: references crossing into undeclared packages.

use crate::checkers::Checker;
use crate::reference::Reference;
use crate::types::ViolationType;

/// Flags references into packages the source package does not declare as
/// dependencies.
///
/// A reference is invalid when the destination package enforces dependency
/// declarations, the source and destination are distinct tracked packages,
/// and the source's declared dependency set does not include the
/// destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyChecker;

impl Checker for DependencyChecker {
    fn violation_type(&self) -> ViolationType {
        ViolationType::Dependency
    }

    fn invalid_reference(&self, reference: &Reference<'_>) -> bool {
        let Some(destination) = reference.destination_package else {
            return false;
        };
        let Some(source) = reference.source_package else {
            return false;
        };
        if !destination.enforce_dependencies {
            return false;
        }
        if source.name == destination.name {
            return false;
        }
        !source.depends_on(&destination.name)
    }

    fn message(&self, reference: &Reference<'_>) -> String {
        let destination = reference
            .destination_package
            .map_or("unknown", |p| p.name.as_str());
        let source = reference
            .source_package
            .map_or("unknown", |p| p.name.as_str());
        format!(
            "Dependency violation: `{}` belongs to `{destination}`, but `{source}` \
             does not declare a dependency on it. \
             Add `{destination}` to the dependencies in `{source}`'s pack.toml.",
            reference.constant_name
        )
    }
}
