//! The two security providers and how they are published.
//!
//! The authentication logic itself lives outside Warden. The coordinator only
//! needs to *build* a provider instance from the retained dependency handles
//! (through a [`ProviderFactory`]) and publish it with the right identity
//! ([`ProviderDescriptor`]).

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use warden_core::properties::{SERVICE_DESCRIPTION, SERVICE_PID, SERVICE_VENDOR};
use warden_core::{Properties, ServiceObject};

/// Interface under which configuration consumers look up the provider.
pub const MANAGED_SERVICE_INTERFACE: &str = "org.osgi.service.cm.ManagedService";

/// Interface the web console looks up.
pub const SECURITY_PROVIDER_INTERFACE: &str =
    "org.apache.felix.webconsole.WebConsoleSecurityProvider";

/// Property distinguishing the two providers.
pub const PROVIDER_ID_PROPERTY: &str = "webconsole.security.provider.id";

/// Persistent id shared by both providers, so configuration follows
/// whichever one is active.
pub const PROVIDER_PID: &str =
    "org.apache.sling.extensions.webconsolesecurityprovider.internal.SlingWebConsoleSecurityProvider";

/// Vendor tag for both providers.
pub const PROVIDER_VENDOR: &str = "The Apache Software Foundation";

/// How a provider is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Value of [`PROVIDER_ID_PROPERTY`].
    pub id: &'static str,
    /// Value of `service.description`.
    pub description: &'static str,
}

impl ProviderDescriptor {
    /// The repository-backed provider.
    pub const REPOSITORY: Self = Self {
        id: "org.apache.sling.extensions.webconsolesecurityprovider",
        description: "Apache Sling Web Console Security Provider",
    };

    /// The authentication-backed provider.
    pub const AUTHENTICATION: Self = Self {
        id: "org.apache.sling.extensions.webconsolesecurityprovider2",
        description: "Apache Sling Web Console Security Provider 2",
    };

    /// Interfaces the provider is registered under.
    pub fn interfaces(&self) -> [&'static str; 2] {
        [MANAGED_SERVICE_INTERFACE, SECURITY_PROVIDER_INTERFACE]
    }

    /// Registration properties.
    pub fn properties(&self) -> Properties {
        let mut props = Properties::new();
        props.insert(SERVICE_PID.into(), Value::from(PROVIDER_PID));
        props.insert(SERVICE_DESCRIPTION.into(), Value::from(self.description));
        props.insert(SERVICE_VENDOR.into(), Value::from(PROVIDER_VENDOR));
        props.insert(PROVIDER_ID_PROPERTY.into(), Value::from(self.id));
        props
    }
}

/// Builds provider instances from dependency handles.
///
/// Hosts plug their concrete security providers in here; the coordinator
/// calls the factory while holding its lock, so implementations must not
/// call back into the coordinator.
pub trait ProviderFactory: Send + Sync {
    /// Builds the provider that authenticates against the repository.
    fn repository_provider(&self, repository: ServiceObject) -> ServiceObject;

    /// Builds the provider that delegates to the authenticator.
    fn authentication_provider(
        &self,
        auth_support: ServiceObject,
        authenticator: ServiceObject,
    ) -> ServiceObject;
}

/// Factory producing [`RepositoryProvider`] and [`AuthenticationProvider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProviderFactory;

impl ProviderFactory for DefaultProviderFactory {
    fn repository_provider(&self, repository: ServiceObject) -> ServiceObject {
        Arc::new(RepositoryProvider { repository })
    }

    fn authentication_provider(
        &self,
        auth_support: ServiceObject,
        authenticator: ServiceObject,
    ) -> ServiceObject {
        Arc::new(AuthenticationProvider {
            auth_support,
            authenticator,
        })
    }
}

/// Provider authenticating console users against the repository.
pub struct RepositoryProvider {
    repository: ServiceObject,
}

impl RepositoryProvider {
    pub fn repository(&self) -> &ServiceObject {
        &self.repository
    }
}

impl fmt::Debug for RepositoryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryProvider").finish_non_exhaustive()
    }
}

/// Provider delegating console authentication to the authenticator.
pub struct AuthenticationProvider {
    auth_support: ServiceObject,
    authenticator: ServiceObject,
}

impl AuthenticationProvider {
    pub fn auth_support(&self) -> &ServiceObject {
        &self.auth_support
    }

    pub fn authenticator(&self) -> &ServiceObject {
        &self.authenticator
    }
}

impl fmt::Debug for AuthenticationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationProvider").finish_non_exhaustive()
    }
}
