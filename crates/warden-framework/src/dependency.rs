//! The external services the coordinator waits for.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Interface of the authentication-support service.
pub const AUTH_SUPPORT_INTERFACE: &str = "org.apache.sling.auth.core.AuthenticationSupport";

/// Interface of the authenticator service.
pub const AUTHENTICATOR_INTERFACE: &str = "org.apache.sling.api.auth.Authenticator";

/// Interface of the content repository.
pub const REPOSITORY_INTERFACE: &str = "javax.jcr.Repository";

/// A tracked dependency.
///
/// The authentication-backed provider needs both [`AuthSupport`] and
/// [`Authenticator`]; the repository-backed provider needs only
/// [`Repository`].
///
/// [`AuthSupport`]: Dependency::AuthSupport
/// [`Authenticator`]: Dependency::Authenticator
/// [`Repository`]: Dependency::Repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    AuthSupport,
    Authenticator,
    Repository,
}

impl Dependency {
    /// All dependencies, in watcher start order.
    pub const ALL: [Dependency; 3] = [Self::AuthSupport, Self::Repository, Self::Authenticator];

    /// The registry interface this dependency is published under.
    pub const fn interface(self) -> &'static str {
        match self {
            Self::AuthSupport => AUTH_SUPPORT_INTERFACE,
            Self::Authenticator => AUTHENTICATOR_INTERFACE,
            Self::Repository => REPOSITORY_INTERFACE,
        }
    }

    /// Short name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthSupport => "auth_support",
            Self::Authenticator => "authenticator",
            Self::Repository => "repository",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
