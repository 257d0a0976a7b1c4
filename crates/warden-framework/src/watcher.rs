//! Per-dependency service tracking.
//!
//! A [`DependencyWatcher`] follows one [`Dependency`] in the registry and
//! keeps at most one instance of it. It tolerates the service appearing late,
//! disappearing, and being superseded by a better-ranked instance:
//!
//! | Event | Retained nothing | Retained `r` |
//! |-------|------------------|--------------|
//! | registered `n` | retain `n`, notify | `n > r`: swap, release `r`, no notify; otherwise ignore |
//! | unregistering `n` | ignore | `n == r`: release, notify; otherwise ignore |
//! | modified `n` | notify | `n == r`: refresh `r`, notify; otherwise notify |
//!
//! The owner is only notified when availability flips, or when a property
//! change might affect it. Notifications are sent **after** the watcher's
//! lock has been released, so the owner may query any watcher while handling
//! them.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, trace};
use warden_core::{
    BoxedRegistry, ServiceEvent, ServiceEventKind, ServiceFilter, ServiceListener, ServiceObject,
    ServiceReference, SubscriptionId,
};

use crate::dependency::Dependency;
use crate::error::{FrameworkError, FrameworkResult};

/// Receives availability changes from watchers.
pub trait DependencyListener: Send + Sync {
    /// Called after `dependency`'s retained instance changed in a way that
    /// may alter the owner's decision.
    fn dependency_changed(&self, dependency: Dependency) -> FrameworkResult<()>;
}

struct Retained {
    reference: ServiceReference,
    handle: ServiceObject,
}

#[derive(Default)]
struct WatcherState {
    retained: Option<Retained>,
    /// Present between `start` and `deactivate`. Registrations are ignored
    /// while absent.
    subscription: Option<SubscriptionId>,
}

/// Tracks the best available instance of one dependency.
pub struct DependencyWatcher {
    dependency: Dependency,
    registry: BoxedRegistry,
    listener: Weak<dyn DependencyListener>,
    state: Mutex<WatcherState>,
}

impl DependencyWatcher {
    /// Creates an idle watcher. Nothing is tracked until [`start`](Self::start).
    pub fn new(
        dependency: Dependency,
        registry: BoxedRegistry,
        listener: Weak<dyn DependencyListener>,
    ) -> Self {
        Self {
            dependency,
            registry,
            listener,
            state: Mutex::new(WatcherState::default()),
        }
    }

    pub fn dependency(&self) -> Dependency {
        self.dependency
    }

    /// Subscribes to the registry, then retains an already-present service.
    ///
    /// The subscription is made first so a service registering concurrently
    /// with the initial lookup is always seen; observing it twice is harmless.
    pub fn start(self: &Arc<Self>) -> FrameworkResult<()> {
        let filter = ServiceFilter::for_interface(self.dependency.interface())?;
        {
            let mut state = self.state.lock();
            if state.subscription.is_some() {
                return Err(FrameworkError::AlreadyStarted(self.dependency));
            }
            let listener = Arc::new(WatcherListener(Arc::downgrade(self)));
            state.subscription = Some(self.registry.subscribe(filter, listener)?);
        }
        debug!(dependency = %self.dependency, "Watching for dependency");

        if let Some(reference) = self.registry.lookup(self.dependency.interface())? {
            self.on_service_registered(&reference)?;
        }
        Ok(())
    }

    /// Stops receiving registry events. The retained instance is kept until
    /// [`release`](Self::release).
    pub fn deactivate(&self) -> FrameworkResult<()> {
        let subscription = self.state.lock().subscription.take();
        if let Some(id) = subscription {
            self.registry.unsubscribe(id)?;
            debug!(dependency = %self.dependency, "Stopped watching dependency");
        }
        Ok(())
    }

    /// Returns the retained instance back to the registry, without notifying.
    pub fn release(&self) -> FrameworkResult<()> {
        let mut state = self.state.lock();
        if let Some(previous) = state.retained.take() {
            self.registry.unget_service(&previous.reference)?;
            debug!(dependency = %self.dependency, service = %previous.reference.id(), "Dependency released");
        }
        Ok(())
    }

    /// The retained instance, if any.
    pub fn current_handle(&self) -> Option<ServiceObject> {
        self.state
            .lock()
            .retained
            .as_ref()
            .map(|r| Arc::clone(&r.handle))
    }

    /// Reference of the retained instance, if any.
    pub fn current_reference(&self) -> Option<ServiceReference> {
        self.state
            .lock()
            .retained
            .as_ref()
            .map(|r| r.reference.clone())
    }

    pub fn is_available(&self) -> bool {
        self.state.lock().retained.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().subscription.is_some()
    }

    /// Applies a registry event.
    pub fn handle_event(&self, event: &ServiceEvent) -> FrameworkResult<()> {
        trace!(dependency = %self.dependency, kind = %event.kind(), service = %event.reference(), "Service event");
        match event.kind() {
            ServiceEventKind::Registered => self.on_service_registered(event.reference()),
            ServiceEventKind::Unregistering => self.on_service_unregistering(event.reference()),
            ServiceEventKind::Modified => self.on_service_modified(event.reference()),
        }
    }

    /// A candidate became visible.
    pub fn on_service_registered(&self, reference: &ServiceReference) -> FrameworkResult<()> {
        if self.retain(reference)? {
            self.notify()?;
        }
        Ok(())
    }

    /// A service is going away. Only the retained one matters.
    pub fn on_service_unregistering(&self, reference: &ServiceReference) -> FrameworkResult<()> {
        let released = {
            let mut state = self.state.lock();
            match state.retained.take_if(|r| r.reference == *reference) {
                Some(previous) => Some(self.registry.unget_service(&previous.reference)),
                None => None,
            }
        };

        match released {
            Some(unget) => {
                debug!(dependency = %self.dependency, service = %reference.id(), "Dependency became unavailable");
                self.notify()?;
                Ok(unget?)
            }
            None => Ok(()),
        }
    }

    /// Properties of a matching service changed. A retained service takes on
    /// its new ranking for later supersede checks.
    pub fn on_service_modified(&self, reference: &ServiceReference) -> FrameworkResult<()> {
        {
            let mut state = self.state.lock();
            if let Some(retained) = state
                .retained
                .as_mut()
                .filter(|r| r.reference == *reference)
            {
                retained.reference = reference.clone();
            }
        }
        self.notify()
    }

    /// Retains `reference` if it beats what is held. Returns `true` when the
    /// dependency went from absent to present.
    fn retain(&self, reference: &ServiceReference) -> FrameworkResult<bool> {
        let mut state = self.state.lock();
        if state.subscription.is_none() {
            trace!(dependency = %self.dependency, service = %reference.id(), "Watcher not started, ignoring");
            return Ok(false);
        }

        let supersedes = state
            .retained
            .as_ref()
            .is_none_or(|current| *reference > current.reference);
        if !supersedes {
            return Ok(false);
        }

        let Some(handle) = self.registry.get_service(reference)? else {
            debug!(dependency = %self.dependency, service = %reference.id(), "Service vanished before it could be retained");
            return Ok(false);
        };

        let previous = state.retained.replace(Retained {
            reference: reference.clone(),
            handle,
        });
        match previous {
            None => {
                debug!(dependency = %self.dependency, service = %reference, "Dependency became available");
                Ok(true)
            }
            Some(previous) => {
                debug!(
                    dependency = %self.dependency,
                    from = %previous.reference.id(),
                    to = %reference.id(),
                    "Dependency superseded by higher-ranked service"
                );
                self.registry.unget_service(&previous.reference)?;
                Ok(false)
            }
        }
    }

    fn notify(&self) -> FrameworkResult<()> {
        match self.listener.upgrade() {
            Some(listener) => listener.dependency_changed(self.dependency),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for DependencyWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DependencyWatcher")
            .field("dependency", &self.dependency)
            .field("retained", &state.retained.as_ref().map(|r| r.reference.id()))
            .field("subscription", &state.subscription)
            .finish()
    }
}

/// Registry-facing listener. Holds the watcher weakly so a forgotten
/// subscription never keeps the watcher alive.
struct WatcherListener(Weak<DependencyWatcher>);

impl ServiceListener for WatcherListener {
    fn service_changed(&self, event: &ServiceEvent) {
        let Some(watcher) = self.0.upgrade() else {
            return;
        };
        if let Err(e) = watcher.handle_event(event) {
            error!(
                dependency = %watcher.dependency,
                kind = %event.kind(),
                service = %event.reference().id(),
                error = %e,
                "Failed to process service event"
            );
        }
    }
}
