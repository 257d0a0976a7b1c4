//! In-memory [`ServiceRegistry`] implementation.
//!
//! [`InMemoryRegistry`] is a complete, thread-safe registry for a single
//! process. Embedders without a host registry can use it directly, and it is
//! the registry every test in the workspace runs against.
//!
//! Events are delivered synchronously on the thread that caused them, after
//! the internal lock has been released. A listener may therefore call back
//! into the registry from inside [`ServiceListener::service_changed`].
//!
//! ```rust,ignore
//! let registry = Arc::new(InMemoryRegistry::new());
//! let reg = registry.register(&["javax.jcr.Repository"], Arc::new(MyRepo), Properties::new())?;
//! let best = registry.lookup("javax.jcr.Repository")?;
//! registry.unregister(&reg)?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{RegistryError, RegistryResult};
use crate::event::{ServiceEvent, ServiceListener};
use crate::filter::ServiceFilter;
use crate::properties::{OBJECT_CLASS, SERVICE_ID};
use crate::reference::{Properties, ServiceId, ServiceObject, ServiceReference};
use crate::registry::{Registration, ServiceRegistry, SubscriptionId};

struct ServiceEntry {
    reference: ServiceReference,
    object: ServiceObject,
    use_count: usize,
}

struct SubscriptionEntry {
    filter: ServiceFilter,
    listener: Arc<dyn ServiceListener>,
}

#[derive(Default)]
struct RegistryState {
    services: BTreeMap<ServiceId, ServiceEntry>,
    subscriptions: BTreeMap<SubscriptionId, SubscriptionEntry>,
}

/// Thread-safe, process-local service registry.
pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
    next_service_id: AtomicU64,
    next_subscription_id: AtomicU64,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            next_service_id: AtomicU64::new(1),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    /// Replaces the properties of a published service and fires
    /// [`Modified`](crate::ServiceEventKind::Modified).
    ///
    /// The interfaces and id are kept; `service.ranking` is re-read from the
    /// new properties. Returns the updated reference.
    pub fn set_properties(
        &self,
        registration: &Registration,
        properties: Properties,
    ) -> RegistryResult<ServiceReference> {
        let reference = {
            let mut state = self.state.write();
            let entry = state
                .services
                .get_mut(&registration.id())
                .ok_or(RegistryError::UnknownRegistration(registration.id()))?;
            let interfaces = entry.reference.interfaces().to_vec();
            let properties = decorate(properties, registration.id(), &interfaces);
            entry.reference = ServiceReference::new(registration.id(), interfaces, properties);
            entry.reference.clone()
        };

        debug!(service = %reference, "Service properties modified");
        self.fire(ServiceEvent::modified(reference.clone()));
        Ok(reference)
    }

    /// Number of outstanding [`get_service`](ServiceRegistry::get_service)
    /// calls for `reference`. Zero once the service is withdrawn.
    pub fn use_count(&self, reference: &ServiceReference) -> usize {
        self.state
            .read()
            .services
            .get(&reference.id())
            .map_or(0, |e| e.use_count)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.read().subscriptions.len()
    }

    /// Number of published services.
    pub fn service_count(&self) -> usize {
        self.state.read().services.len()
    }

    /// All services published under `interface`, best-ranked first.
    pub fn references(&self, interface: &str) -> Vec<ServiceReference> {
        let mut refs: Vec<ServiceReference> = self
            .state
            .read()
            .services
            .values()
            .filter(|e| e.reference.provides(interface))
            .map(|e| e.reference.clone())
            .collect();
        refs.sort_by(|a, b| b.cmp(a));
        refs
    }

    /// Snapshot of the listeners interested in `reference`.
    fn listeners_for(&self, reference: &ServiceReference) -> Vec<Arc<dyn ServiceListener>> {
        self.state
            .read()
            .subscriptions
            .values()
            .filter(|s| s.filter.matches(reference))
            .map(|s| Arc::clone(&s.listener))
            .collect()
    }

    /// Delivers `event` to every matching listener. Must be called without
    /// holding the state lock.
    fn fire(&self, event: ServiceEvent) {
        let listeners = self.listeners_for(event.reference());
        trace!(
            kind = %event.kind(),
            service = %event.reference(),
            listeners = listeners.len(),
            "Delivering service event"
        );
        for listener in listeners {
            listener.service_changed(&event);
        }
    }
}

/// Adds the registry-owned `service.id` and `objectClass` properties.
fn decorate(mut properties: Properties, id: ServiceId, interfaces: &[String]) -> Properties {
    properties.insert(SERVICE_ID.to_string(), Value::from(id.0));
    properties.insert(
        OBJECT_CLASS.to_string(),
        Value::Array(interfaces.iter().cloned().map(Value::String).collect()),
    );
    properties
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("InMemoryRegistry")
            .field("services", &state.services.len())
            .field("subscriptions", &state.subscriptions.len())
            .finish()
    }
}

impl ServiceRegistry for InMemoryRegistry {
    fn subscribe(
        &self,
        filter: ServiceFilter,
        listener: Arc<dyn ServiceListener>,
    ) -> RegistryResult<SubscriptionId> {
        let id = SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::Relaxed));
        debug!(subscription = %id, filter = %filter, "Listener subscribed");
        self.state
            .write()
            .subscriptions
            .insert(id, SubscriptionEntry { filter, listener });
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> RegistryResult<()> {
        self.state
            .write()
            .subscriptions
            .remove(&id)
            .map(|_| debug!(subscription = %id, "Listener unsubscribed"))
            .ok_or(RegistryError::UnknownSubscription(id))
    }

    fn lookup(&self, interface: &str) -> RegistryResult<Option<ServiceReference>> {
        Ok(self
            .state
            .read()
            .services
            .values()
            .filter(|e| e.reference.provides(interface))
            .map(|e| &e.reference)
            .max()
            .cloned())
    }

    fn get_service(&self, reference: &ServiceReference) -> RegistryResult<Option<ServiceObject>> {
        let mut state = self.state.write();
        Ok(state.services.get_mut(&reference.id()).map(|entry| {
            entry.use_count += 1;
            Arc::clone(&entry.object)
        }))
    }

    fn unget_service(&self, reference: &ServiceReference) -> RegistryResult<()> {
        let mut state = self.state.write();
        if let Some(entry) = state.services.get_mut(&reference.id()) {
            entry.use_count = entry.use_count.saturating_sub(1);
        }
        Ok(())
    }

    fn register(
        &self,
        interfaces: &[&str],
        service: ServiceObject,
        properties: Properties,
    ) -> RegistryResult<Registration> {
        if interfaces.is_empty() {
            return Err(RegistryError::EmptyInterfaces);
        }

        let id = ServiceId(self.next_service_id.fetch_add(1, Ordering::Relaxed));
        let interfaces: Vec<String> = interfaces.iter().map(|s| s.to_string()).collect();
        let properties = decorate(properties, id, &interfaces);
        let reference = ServiceReference::new(id, interfaces, properties);

        self.state.write().services.insert(
            id,
            ServiceEntry {
                reference: reference.clone(),
                object: service,
                use_count: 0,
            },
        );

        debug!(service = %reference, "Service registered");
        self.fire(ServiceEvent::registered(reference.clone()));
        Ok(Registration::new(reference))
    }

    fn unregister(&self, registration: &Registration) -> RegistryResult<()> {
        // Removed before the event fires: a concurrent unregister of the same
        // registration fails instead of notifying twice.
        let entry = self
            .state
            .write()
            .services
            .remove(&registration.id())
            .ok_or(RegistryError::UnknownRegistration(registration.id()))?;

        debug!(
            service = %entry.reference,
            outstanding_uses = entry.use_count,
            "Service unregistering"
        );
        self.fire(ServiceEvent::unregistering(entry.reference));
        Ok(())
    }
}
