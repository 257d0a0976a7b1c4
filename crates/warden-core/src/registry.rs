//! The service registry boundary.
//!
//! [`ServiceRegistry`] is everything the coordinator needs from its host:
//! subscriptions, lookup, handle acquisition and publication. The trait is
//! synchronous; every call is expected to return promptly and to deliver any
//! resulting [`ServiceEvent`](crate::ServiceEvent)s *without* holding the
//! registry's own locks, so that listeners may call back into the registry.

use std::fmt;
use std::sync::Arc;

use crate::error::RegistryResult;
use crate::event::ServiceListener;
use crate::filter::ServiceFilter;
use crate::reference::{Properties, ServiceId, ServiceObject, ServiceReference};

/// Identifier of a listener subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Handle to a service published through [`ServiceRegistry::register`].
///
/// Dropping a registration does **not** withdraw the service; call
/// [`ServiceRegistry::unregister`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    reference: ServiceReference,
}

impl Registration {
    pub fn new(reference: ServiceReference) -> Self {
        Self { reference }
    }

    pub fn id(&self) -> ServiceId {
        self.reference.id()
    }

    pub fn reference(&self) -> &ServiceReference {
        &self.reference
    }
}

/// A process-local service registry.
pub trait ServiceRegistry: Send + Sync {
    /// Subscribes `listener` to changes of services matching `filter`.
    fn subscribe(
        &self,
        filter: ServiceFilter,
        listener: Arc<dyn ServiceListener>,
    ) -> RegistryResult<SubscriptionId>;

    /// Removes a subscription. No further events are delivered for it.
    fn unsubscribe(&self, id: SubscriptionId) -> RegistryResult<()>;

    /// Returns the best-ranked service currently published under `interface`.
    fn lookup(&self, interface: &str) -> RegistryResult<Option<ServiceReference>>;

    /// Acquires the service instance behind `reference`.
    ///
    /// Returns `Ok(None)` when the service was withdrawn in the meantime.
    /// Every successful call must be balanced by [`unget_service`](Self::unget_service).
    fn get_service(&self, reference: &ServiceReference) -> RegistryResult<Option<ServiceObject>>;

    /// Releases one use of the service behind `reference`.
    fn unget_service(&self, reference: &ServiceReference) -> RegistryResult<()>;

    /// Publishes `service` under `interfaces`.
    fn register(
        &self,
        interfaces: &[&str],
        service: ServiceObject,
        properties: Properties,
    ) -> RegistryResult<Registration>;

    /// Withdraws a service previously published with [`register`](Self::register).
    fn unregister(&self, registration: &Registration) -> RegistryResult<()>;
}

/// Shared registry handle.
pub type BoxedRegistry = Arc<dyn ServiceRegistry>;
