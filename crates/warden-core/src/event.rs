//! Registry change notifications.

use std::fmt;

use crate::reference::ServiceReference;

/// What happened to a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceEventKind {
    /// The service was just published.
    Registered,
    /// The service's properties changed; the instance is unchanged.
    Modified,
    /// The service is about to be withdrawn. Listeners still holding the
    /// instance should release it.
    Unregistering,
}

impl fmt::Display for ServiceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Registered => "registered",
            Self::Modified => "modified",
            Self::Unregistering => "unregistering",
        })
    }
}

/// A single change notification.
#[derive(Debug, Clone)]
pub struct ServiceEvent {
    kind: ServiceEventKind,
    reference: ServiceReference,
}

impl ServiceEvent {
    pub fn new(kind: ServiceEventKind, reference: ServiceReference) -> Self {
        Self { kind, reference }
    }

    pub fn registered(reference: ServiceReference) -> Self {
        Self::new(ServiceEventKind::Registered, reference)
    }

    pub fn modified(reference: ServiceReference) -> Self {
        Self::new(ServiceEventKind::Modified, reference)
    }

    pub fn unregistering(reference: ServiceReference) -> Self {
        Self::new(ServiceEventKind::Unregistering, reference)
    }

    pub fn kind(&self) -> ServiceEventKind {
        self.kind
    }

    pub fn reference(&self) -> &ServiceReference {
        &self.reference
    }
}

/// Receives registry notifications for a subscription.
///
/// Callbacks run synchronously on whichever thread changed the registry,
/// possibly on several threads at once. Implementations must be cheap and
/// must not assume any particular thread.
pub trait ServiceListener: Send + Sync {
    /// Called once per matching change.
    fn service_changed(&self, event: &ServiceEvent);
}

impl<F> ServiceListener for F
where
    F: Fn(&ServiceEvent) + Send + Sync,
{
    fn service_changed(&self, event: &ServiceEvent) {
        self(event)
    }
}
