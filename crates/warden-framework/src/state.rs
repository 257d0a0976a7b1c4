//! Activation states and the decision function.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::preference::Preference;

/// Which provider, if any, is published.
///
/// ```text
///                 on_dependency_changed()
///   Inactive ◀──────────────────────────────▶ Repository
///      ▲                                          ▲
///      └──────────────▶ Authentication ◀──────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    /// No provider is published.
    #[default]
    Inactive,
    /// The repository-backed provider is published.
    Repository,
    /// The authentication-backed provider is published.
    Authentication,
}

impl fmt::Display for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inactive => "inactive",
            Self::Repository => "repository",
            Self::Authentication => "authentication",
        })
    }
}

/// Derives the state the coordinator should converge to.
///
/// `repository_available` means the repository is present.
/// `authentication_available` means the authentication support *and* the
/// authenticator are both present.
///
/// With no explicit preference the authentication-backed provider wins
/// whenever it is viable.
pub fn target_state(
    preference: Preference,
    repository_available: bool,
    authentication_available: bool,
) -> ActivationState {
    if !repository_available && !authentication_available {
        return ActivationState::Inactive;
    }
    match preference {
        Preference::Repository if repository_available => ActivationState::Repository,
        Preference::Authentication if authentication_available => {
            ActivationState::Authentication
        }
        Preference::Default if authentication_available => ActivationState::Authentication,
        Preference::Default => ActivationState::Repository,
        _ => ActivationState::Inactive,
    }
}

#[cfg(test)]
mod tests {
    use super::ActivationState::{Authentication, Inactive, Repository};
    use super::*;

    fn check(preference: Preference, repo: bool, auth: bool, expected: ActivationState) {
        assert_eq!(
            target_state(preference, repo, auth),
            expected,
            "preference={preference}, repository={repo}, authentication={auth}"
        );
    }

    #[test]
    fn test_default_preference() {
        check(Preference::Default, false, false, Inactive);
        check(Preference::Default, true, false, Repository);
        check(Preference::Default, false, true, Authentication);
        check(Preference::Default, true, true, Authentication);
    }

    #[test]
    fn test_forced_repository() {
        check(Preference::Repository, false, false, Inactive);
        check(Preference::Repository, true, false, Repository);
        check(Preference::Repository, false, true, Inactive);
        check(Preference::Repository, true, true, Repository);
    }

    #[test]
    fn test_forced_authentication() {
        check(Preference::Authentication, false, false, Inactive);
        check(Preference::Authentication, true, false, Inactive);
        check(Preference::Authentication, false, true, Authentication);
        check(Preference::Authentication, true, true, Authentication);
    }
}
