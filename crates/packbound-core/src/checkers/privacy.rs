//! Privacy checker: references to constants a package keeps private.

use crate::checkers::Checker;
use crate::reference::Reference;
use crate::types::ViolationType;

/// Flags references to non-public constants of packages that enforce
/// privacy.
///
/// A reference is invalid when the destination package enforces privacy
/// for the constant, the constant is not part of the destination's public
/// API, and the reference comes from outside the destination. When
/// enforcement names specific constants, matching is exact — a constant
/// whose name merely starts with an enforced name is not covered.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivacyChecker;

impl Checker for PrivacyChecker {
    fn violation_type(&self) -> ViolationType {
        ViolationType::Privacy
    }

    fn invalid_reference(&self, reference: &Reference<'_>) -> bool {
        let Some(destination) = reference.destination_package else {
            return false;
        };
        if reference
            .source_package
            .is_some_and(|source| source.name == destination.name)
        {
            return false;
        }
        if reference.public {
            return false;
        }
        destination
            .enforce_privacy
            .enforced_for(&reference.constant_name)
    }

    fn message(&self, reference: &Reference<'_>) -> String {
        let destination = reference
            .destination_package
            .map_or("unknown", |p| p.name.as_str());
        let public_path = reference
            .destination_package
            .map_or_else(String::new, |p| {
                p.root.join(&p.public_path).display().to_string()
            });
        format!(
            "Privacy violation: `{}` is private to `{destination}`. \
             Public entrypoints for `{destination}` live under `{public_path}/`.",
            reference.constant_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{EnforcePrivacy, Package};
    use crate::types::SourceLocation;
    use std::path::PathBuf;

    fn enforcing(mode: EnforcePrivacy) -> Package {
        Package::new("payments", "packs/payments").with_enforce_privacy(mode)
    }

    fn constants(names: &[&str]) -> EnforcePrivacy {
        EnforcePrivacy::Constants(names.iter().map(ToString::to_string).collect())
    }

    fn build_reference<'a>(
        destination: &'a Package,
        source: Option<&'a Package>,
        constant: &str,
        public: bool,
    ) -> Reference<'a> {
        Reference {
            referencing_file: PathBuf::from("packs/billing/app/charge.rb"),
            source_package: source,
            destination_package: Some(destination),
            constant_name: constant.to_string(),
            location: SourceLocation::new(3, 1),
            public,
        }
    }

    #[test]
    fn ignores_non_enforcing_destination() {
        let destination = enforcing(EnforcePrivacy::Off);
        let reference = build_reference(&destination, None, "::SomeName", false);
        assert!(!PrivacyChecker.invalid_reference(&reference));
    }

    #[test]
    fn ignores_destination_enforcing_other_constants() {
        let destination = enforcing(constants(&["::OtherConstant"]));
        let reference = build_reference(&destination, None, "::SomeName", false);
        assert!(!PrivacyChecker.invalid_reference(&reference));
    }

    #[test]
    fn complains_about_private_constant_when_enforcing_everything() {
        let destination = enforcing(EnforcePrivacy::All);
        let reference = build_reference(&destination, None, "::SomeName", false);
        assert!(PrivacyChecker.invalid_reference(&reference));
    }

    #[test]
    fn complains_when_enforcing_specific_constant() {
        let destination = enforcing(constants(&["::SomeName"]));
        let reference = build_reference(&destination, None, "::SomeName", false);
        assert!(PrivacyChecker.invalid_reference(&reference));
    }

    #[test]
    fn ignores_constant_that_starts_like_enforced_constant() {
        let destination = enforcing(constants(&["::SomeName"]));
        let reference = build_reference(&destination, None, "::SomeNameButNotQuite", false);
        assert!(!PrivacyChecker.invalid_reference(&reference));
    }

    #[test]
    fn ignores_public_constant_even_when_enforcing_everything() {
        let destination = enforcing(EnforcePrivacy::All);
        let reference = build_reference(&destination, None, "::SomeName", true);
        assert!(!PrivacyChecker.invalid_reference(&reference));
    }

    #[test]
    fn ignores_references_within_the_same_package() {
        let destination = enforcing(EnforcePrivacy::All);
        let reference = build_reference(&destination, Some(&destination), "::SomeName", false);
        assert!(!PrivacyChecker.invalid_reference(&reference));
    }

    #[test]
    fn ignores_untracked_destination() {
        let source = Package::new("billing", "packs/billing");
        let reference = Reference {
            referencing_file: PathBuf::from("packs/billing/app/charge.rb"),
            source_package: Some(&source),
            destination_package: None,
            constant_name: "::SomeName".to_string(),
            location: SourceLocation::new(1, 1),
            public: false,
        };
        assert!(!PrivacyChecker.invalid_reference(&reference));
    }

    #[test]
    fn message_names_constant_and_package() {
        let destination = enforcing(EnforcePrivacy::All);
        let reference = build_reference(&destination, None, "::SomeName", false);
        let message = PrivacyChecker.message(&reference);
        assert!(message.starts_with("Privacy violation"));
        assert!(message.contains("::SomeName"));
        assert!(message.contains("payments"));
        assert!(message.contains("packs/payments/public/"));
    }
}
