//! Auth-type preference resolution.
//!
//! The operator can force one provider through a single configuration value
//! (mirroring the host property [`AUTH_TYPE_PROPERTY`]):
//!
//! | Value | Preference |
//! |-------|------------|
//! | `"jcrAuth"` | [`Preference::Repository`]: always authenticate against the repository |
//! | `"slingAuth"` | [`Preference::Authentication`]: always use the authenticator |
//! | absent / empty | [`Preference::Default`]: authenticator if possible, repository otherwise |
//! | anything else | [`Preference::Default`], with a warning |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FrameworkError;

/// Name of the host property carrying the auth type.
pub const AUTH_TYPE_PROPERTY: &str = "sling.webconsole.authType";

/// Literal forcing the repository-backed provider.
pub const JCR_AUTH: &str = "jcrAuth";

/// Literal forcing the authentication-backed provider.
pub const SLING_AUTH: &str = "slingAuth";

/// Which provider the operator asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preference {
    /// Prefer the authentication-backed provider, fall back to the repository.
    #[default]
    #[serde(rename = "default")]
    Default,
    /// Only ever activate the repository-backed provider.
    #[serde(rename = "jcrAuth")]
    Repository,
    /// Only ever activate the authentication-backed provider.
    #[serde(rename = "slingAuth")]
    Authentication,
}

impl Preference {
    /// Resolves a configured value.
    ///
    /// Never fails: an unrecognised value is logged and treated as absent,
    /// so that a typo can never select a provider nobody asked for.
    pub fn resolve(configured: Option<&str>) -> Self {
        match configured.map(str::trim) {
            None | Some("") => Self::Default,
            Some(value) => value.parse().unwrap_or_else(|e: FrameworkError| {
                warn!(
                    property = AUTH_TYPE_PROPERTY,
                    value = %value,
                    error = %e,
                    "Ignoring invalid auth type for web console security provider"
                );
                Self::Default
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Repository => JCR_AUTH,
            Self::Authentication => SLING_AUTH,
        }
    }
}

impl FromStr for Preference {
    type Err = FrameworkError;

    /// Strict parse of the two recognised literals. `"default"` is not
    /// accepted; absence is expressed as `None` to [`Preference::resolve`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            JCR_AUTH => Ok(Self::Repository),
            SLING_AUTH => Ok(Self::Authentication),
            other => Err(FrameworkError::UnknownPreference(other.to_string())),
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_recognised_literals() {
        assert_eq!(Preference::resolve(Some("jcrAuth")), Preference::Repository);
        assert_eq!(Preference::resolve(Some("slingAuth")), Preference::Authentication);
    }

    #[test]
    fn test_resolve_absent_is_default() {
        assert_eq!(Preference::resolve(None), Preference::Default);
        assert_eq!(Preference::resolve(Some("")), Preference::Default);
        assert_eq!(Preference::resolve(Some("   ")), Preference::Default);
    }

    #[test]
    fn test_resolve_unrecognised_falls_back_to_default() {
        assert_eq!(Preference::resolve(Some("ldapAuth")), Preference::Default);
        assert_eq!(Preference::resolve(Some("JCRAUTH")), Preference::Default);
        assert_eq!(Preference::resolve(Some("default")), Preference::Default);
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        let err = "sling".parse::<Preference>().unwrap_err();
        assert_eq!(err, FrameworkError::UnknownPreference("sling".into()));
    }

    #[test]
    fn test_display_round_trips_forced_values() {
        for p in [Preference::Repository, Preference::Authentication] {
            assert_eq!(p.to_string().parse::<Preference>().unwrap(), p);
        }
        assert_eq!(Preference::Default.to_string(), "default");
    }

    #[test]
    fn test_serde_uses_literals() {
        assert_eq!(
            serde_json::to_string(&Preference::Repository).unwrap(),
            "\"jcrAuth\""
        );
        let p: Preference = serde_json::from_str("\"slingAuth\"").unwrap();
        assert_eq!(p, Preference::Authentication);
    }
}
