//! Security-provider coordination.
//!
//! [`ServiceCoordinator`] owns one [`DependencyWatcher`] per [`Dependency`]
//! and publishes at most one security provider at a time:
//!
//! ```text
//! registry ──event──▶ watcher ──dependency_changed──▶ coordinator
//!                                                        │
//!       ┌────────────────────────────────────────────────┘
//!       ▼
//!   target_state(preference, repository?, auth_support? && authenticator?)
//!       │
//!       ▼
//!   unregister the active provider ──▶ register the target provider
//! ```
//!
//! Every decision runs under one coordinator lock, so concurrent
//! notifications are applied one after another and each recomputes against
//! the availability current at that moment. The active provider is always
//! withdrawn before the next one is published; the registry never sees both.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry: BoxedRegistry = Arc::new(InMemoryRegistry::new());
//! let coordinator = ServiceCoordinator::new(
//!     registry,
//!     config.webconsole.auth_type.as_deref(),
//!     Arc::new(DefaultProviderFactory),
//! )?;
//! // …services come and go…
//! coordinator.deactivate()?;
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{Level, debug, info, span, warn};
use warden_core::{BoxedRegistry, Registration, ServiceId, ServiceObject};

use crate::dependency::Dependency;
use crate::error::FrameworkResult;
use crate::preference::Preference;
use crate::provider::{ProviderDescriptor, ProviderFactory};
use crate::state::{ActivationState, target_state};
use crate::watcher::{DependencyListener, DependencyWatcher};

/// What is currently published. Holding the registration inside the variant
/// keeps "at most one provider" true by construction.
enum Activation {
    Inactive,
    Repository(Registration),
    Authentication(Registration),
}

impl Activation {
    fn state(&self) -> ActivationState {
        match self {
            Self::Inactive => ActivationState::Inactive,
            Self::Repository(_) => ActivationState::Repository,
            Self::Authentication(_) => ActivationState::Authentication,
        }
    }

    fn registration(&self) -> Option<&Registration> {
        match self {
            Self::Inactive => None,
            Self::Repository(reg) | Self::Authentication(reg) => Some(reg),
        }
    }
}

struct CoordinatorState {
    activation: Activation,
    /// Set by `deactivate`; late notifications are ignored afterwards.
    closed: bool,
}

struct Shared {
    registry: BoxedRegistry,
    factory: Arc<dyn ProviderFactory>,
    preference: Preference,
    auth_support: Arc<DependencyWatcher>,
    authenticator: Arc<DependencyWatcher>,
    repository: Arc<DependencyWatcher>,
    state: Mutex<CoordinatorState>,
}

impl Shared {
    fn watcher(&self, dependency: Dependency) -> &Arc<DependencyWatcher> {
        match dependency {
            Dependency::AuthSupport => &self.auth_support,
            Dependency::Authenticator => &self.authenticator,
            Dependency::Repository => &self.repository,
        }
    }

    fn watchers(&self) -> impl Iterator<Item = &Arc<DependencyWatcher>> {
        Dependency::ALL.into_iter().map(|d| self.watcher(d))
    }

    /// Recomputes the target state and performs the transition if needed.
    fn converge(&self) -> FrameworkResult<ActivationState> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(state.activation.state());
        }

        let auth_support = self.auth_support.current_handle();
        let authenticator = self.authenticator.current_handle();
        let repository = self.repository.current_handle();

        let current = state.activation.state();
        let target = target_state(
            self.preference,
            repository.is_some(),
            auth_support.is_some() && authenticator.is_some(),
        );
        if target == current {
            debug!(state = %current, "Security provider unchanged");
            return Ok(current);
        }

        let span = span!(Level::INFO, "transition", from = %current, to = %target);
        let _enter = span.enter();

        self.withdraw(&mut state.activation)?;

        state.activation = match (target, repository, auth_support, authenticator) {
            (ActivationState::Repository, Some(repository), _, _) => {
                let provider = self.factory.repository_provider(repository);
                Activation::Repository(self.publish(ProviderDescriptor::REPOSITORY, provider)?)
            }
            (ActivationState::Authentication, _, Some(auth_support), Some(authenticator)) => {
                let provider = self
                    .factory
                    .authentication_provider(auth_support, authenticator);
                Activation::Authentication(
                    self.publish(ProviderDescriptor::AUTHENTICATION, provider)?,
                )
            }
            _ => Activation::Inactive,
        };

        info!(
            preference = %self.preference,
            state = %target,
            "Web console security provider changed"
        );
        Ok(target)
    }

    /// Unregisters the active provider, if any. On failure the provider is
    /// still recorded as active.
    fn withdraw(&self, activation: &mut Activation) -> FrameworkResult<()> {
        let Some(registration) = activation.registration() else {
            return Ok(());
        };
        self.registry.unregister(registration)?;
        info!(service = %registration.id(), state = %activation.state(), "Security provider unregistered");
        *activation = Activation::Inactive;
        Ok(())
    }

    fn publish(
        &self,
        descriptor: ProviderDescriptor,
        provider: ServiceObject,
    ) -> FrameworkResult<Registration> {
        let registration =
            self.registry
                .register(&descriptor.interfaces(), provider, descriptor.properties())?;
        info!(
            provider = descriptor.id,
            service = %registration.id(),
            "Security provider registered"
        );
        Ok(registration)
    }
}

impl DependencyListener for Shared {
    fn dependency_changed(&self, dependency: Dependency) -> FrameworkResult<()> {
        debug!(dependency = %dependency, "Dependency changed");
        self.converge().map(|_| ())
    }
}

/// Availability of one dependency, as reported by [`CoordinatorStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    pub dependency: Dependency,
    pub interface: &'static str,
    pub available: bool,
    /// Id of the retained service.
    pub service_id: Option<ServiceId>,
}

/// Diagnostic snapshot of a coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorStatus {
    pub preference: Preference,
    pub state: ActivationState,
    pub dependencies: Vec<DependencyStatus>,
}

/// Chooses and publishes the web console security provider.
///
/// Provider registration and unregistration happen while the coordinator's
/// lock is held, and the registry delivers the resulting events on the same
/// thread. Listeners on the security provider interface must therefore not
/// call back into the coordinator (`state`, `status`, `deactivate`, ...)
/// from within the event; the lock is not reentrant and the call would
/// deadlock.
pub struct ServiceCoordinator {
    shared: Arc<Shared>,
}

impl ServiceCoordinator {
    /// Creates the coordinator and starts all watchers.
    ///
    /// `auth_type` is the configured preference literal; see
    /// [`Preference::resolve`]. Services already present are picked up
    /// immediately, so a provider may be published before this returns.
    pub fn new(
        registry: BoxedRegistry,
        auth_type: Option<&str>,
        factory: Arc<dyn ProviderFactory>,
    ) -> FrameworkResult<Self> {
        Self::with_preference(registry, Preference::resolve(auth_type), factory)
    }

    /// Like [`new`](Self::new) with an already resolved preference.
    pub fn with_preference(
        registry: BoxedRegistry,
        preference: Preference,
        factory: Arc<dyn ProviderFactory>,
    ) -> FrameworkResult<Self> {
        let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
            let listener: Weak<dyn DependencyListener> = weak.clone();
            let watcher = |dependency| {
                Arc::new(DependencyWatcher::new(
                    dependency,
                    Arc::clone(&registry),
                    listener.clone(),
                ))
            };
            Shared {
                auth_support: watcher(Dependency::AuthSupport),
                authenticator: watcher(Dependency::Authenticator),
                repository: watcher(Dependency::Repository),
                registry: Arc::clone(&registry),
                factory,
                preference,
                state: Mutex::new(CoordinatorState {
                    activation: Activation::Inactive,
                    closed: false,
                }),
            }
        });
        let coordinator = Self { shared };

        info!(preference = %preference, "Starting web console security provider coordinator");
        for dependency in Dependency::ALL {
            if let Err(e) = coordinator.shared.watcher(dependency).start() {
                if let Err(teardown) = coordinator.deactivate() {
                    warn!(error = %teardown, "Teardown after failed start also failed");
                }
                return Err(e);
            }
        }
        Ok(coordinator)
    }

    /// Recomputes the target state from the watchers and converges to it.
    /// Returns the resulting state.
    pub fn on_dependency_changed(&self) -> FrameworkResult<ActivationState> {
        self.shared.converge()
    }

    /// Stops all watchers, withdraws the active provider and releases every
    /// retained dependency.
    ///
    /// Each step is attempted even if an earlier one fails; the first error
    /// is returned. Calling it again is harmless. Dropping the coordinator
    /// deactivates it as well.
    pub fn deactivate(&self) -> FrameworkResult<()> {
        let mut state = self.shared.state.lock();
        let was_closed = std::mem::replace(&mut state.closed, true);

        let mut first_error = None;
        for watcher in self.shared.watchers() {
            if let Err(e) = watcher.deactivate() {
                warn!(dependency = %watcher.dependency(), error = %e, "Failed to stop watcher");
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.shared.withdraw(&mut state.activation) {
            warn!(error = %e, "Failed to unregister security provider");
            first_error.get_or_insert(e);
        }
        for watcher in self.shared.watchers() {
            if let Err(e) = watcher.release() {
                warn!(dependency = %watcher.dependency(), error = %e, "Failed to release dependency");
                first_error.get_or_insert(e);
            }
        }

        if !was_closed {
            info!("Web console security provider coordinator stopped");
        }
        first_error.map_or(Ok(()), Err)
    }

    /// The state the coordinator last converged to.
    pub fn state(&self) -> ActivationState {
        self.shared.state.lock().activation.state()
    }

    pub fn preference(&self) -> Preference {
        self.shared.preference
    }

    /// The watcher tracking `dependency`.
    pub fn watcher(&self, dependency: Dependency) -> &Arc<DependencyWatcher> {
        self.shared.watcher(dependency)
    }

    /// Registration of the published provider, if any.
    pub fn active_registration(&self) -> Option<Registration> {
        self.shared.state.lock().activation.registration().cloned()
    }

    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            preference: self.shared.preference,
            state: self.state(),
            dependencies: Dependency::ALL
                .into_iter()
                .map(|dependency| {
                    let reference = self.shared.watcher(dependency).current_reference();
                    DependencyStatus {
                        dependency,
                        interface: dependency.interface(),
                        available: reference.is_some(),
                        service_id: reference.map(|r| r.id()),
                    }
                })
                .collect(),
        }
    }
}

impl Drop for ServiceCoordinator {
    fn drop(&mut self) {
        if let Err(e) = self.deactivate() {
            warn!(error = %e, "Failed to stop coordinator on drop");
        }
    }
}

impl std::fmt::Debug for ServiceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCoordinator")
            .field("preference", &self.shared.preference)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
    use std::thread;

    use serde_json::json;
    use warden_core::properties::SERVICE_RANKING;
    use warden_core::{
        InMemoryRegistry, Properties, RegistryError, RegistryResult, ServiceEvent,
        ServiceEventKind, ServiceFilter, ServiceListener, ServiceReference, ServiceRegistry,
        SubscriptionId,
    };

    use crate::provider::{
        AuthenticationProvider, DefaultProviderFactory, PROVIDER_ID_PROPERTY, RepositoryProvider,
        SECURITY_PROVIDER_INTERFACE,
    };

    /// Counts provider (un)registrations and tracks how many are live at once.
    #[derive(Default)]
    struct ProviderMonitor {
        registered: AtomicUsize,
        unregistered: AtomicUsize,
        live: AtomicIsize,
        max_live: AtomicIsize,
    }

    impl ProviderMonitor {
        fn attach(registry: &InMemoryRegistry) -> Arc<Self> {
            let monitor = Arc::new(Self::default());
            registry
                .subscribe(
                    ServiceFilter::for_interface(SECURITY_PROVIDER_INTERFACE).unwrap(),
                    monitor.clone(),
                )
                .unwrap();
            monitor
        }

        fn registered(&self) -> usize {
            self.registered.load(Ordering::SeqCst)
        }

        fn unregistered(&self) -> usize {
            self.unregistered.load(Ordering::SeqCst)
        }

        fn max_live(&self) -> isize {
            self.max_live.load(Ordering::SeqCst)
        }
    }

    impl ServiceListener for ProviderMonitor {
        fn service_changed(&self, event: &ServiceEvent) {
            match event.kind() {
                ServiceEventKind::Registered => {
                    self.registered.fetch_add(1, Ordering::SeqCst);
                    let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_live.fetch_max(live, Ordering::SeqCst);
                }
                ServiceEventKind::Unregistering => {
                    self.unregistered.fetch_add(1, Ordering::SeqCst);
                    self.live.fetch_sub(1, Ordering::SeqCst);
                }
                ServiceEventKind::Modified => {}
            }
        }
    }

    fn publish(registry: &InMemoryRegistry, dependency: Dependency) -> Registration {
        registry
            .register(
                &[dependency.interface()],
                Arc::new(dependency.as_str()),
                Properties::new(),
            )
            .unwrap()
    }

    fn coordinator(registry: &Arc<InMemoryRegistry>, auth_type: Option<&str>) -> ServiceCoordinator {
        ServiceCoordinator::new(registry.clone(), auth_type, Arc::new(DefaultProviderFactory))
            .unwrap()
    }

    fn active_provider_id(registry: &InMemoryRegistry) -> Option<String> {
        registry
            .lookup(SECURITY_PROVIDER_INTERFACE)
            .unwrap()
            .and_then(|r| r.property(PROVIDER_ID_PROPERTY).cloned())
            .and_then(|v| v.as_str().map(str::to_string))
    }

    #[test]
    fn test_starts_inactive_without_dependencies() {
        let registry = Arc::new(InMemoryRegistry::new());
        let coordinator = coordinator(&registry, None);

        assert_eq!(coordinator.state(), ActivationState::Inactive);
        assert_eq!(coordinator.preference(), Preference::Default);
        assert!(active_provider_id(&registry).is_none());
        assert_eq!(registry.subscription_count(), 3);
    }

    #[test]
    fn test_existing_repository_activates_repository_provider() {
        let registry = Arc::new(InMemoryRegistry::new());
        publish(&registry, Dependency::Repository);

        let coordinator = coordinator(&registry, None);

        assert_eq!(coordinator.state(), ActivationState::Repository);
        assert_eq!(
            active_provider_id(&registry).as_deref(),
            Some(ProviderDescriptor::REPOSITORY.id)
        );
        let reference = registry.lookup(SECURITY_PROVIDER_INTERFACE).unwrap().unwrap();
        let provider = registry.get_service(&reference).unwrap().unwrap();
        let provider = provider.downcast_ref::<RepositoryProvider>().unwrap();
        assert_eq!(
            provider.repository().downcast_ref::<&'static str>(),
            Some(&"repository")
        );
    }

    #[test]
    fn test_default_switches_to_authentication_when_both_parts_arrive() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitor = ProviderMonitor::attach(&registry);
        publish(&registry, Dependency::Repository);
        let coordinator = coordinator(&registry, None);
        assert_eq!(coordinator.state(), ActivationState::Repository);

        // half of the authentication backend does not count
        publish(&registry, Dependency::AuthSupport);
        assert_eq!(coordinator.state(), ActivationState::Repository);

        publish(&registry, Dependency::Authenticator);
        assert_eq!(coordinator.state(), ActivationState::Authentication);
        assert_eq!(
            active_provider_id(&registry).as_deref(),
            Some(ProviderDescriptor::AUTHENTICATION.id)
        );
        assert_eq!(registry.references(SECURITY_PROVIDER_INTERFACE).len(), 1);

        let reference = registry.lookup(SECURITY_PROVIDER_INTERFACE).unwrap().unwrap();
        let provider = registry.get_service(&reference).unwrap().unwrap();
        assert!(provider.downcast_ref::<AuthenticationProvider>().is_some());

        assert_eq!(monitor.registered(), 2);
        assert_eq!(monitor.unregistered(), 1);
        assert_eq!(monitor.max_live(), 1);
    }

    #[test]
    fn test_losing_authenticator_falls_back_to_repository() {
        let registry = Arc::new(InMemoryRegistry::new());
        publish(&registry, Dependency::Repository);
        publish(&registry, Dependency::AuthSupport);
        let authenticator = publish(&registry, Dependency::Authenticator);
        let coordinator = coordinator(&registry, None);
        assert_eq!(coordinator.state(), ActivationState::Authentication);

        registry.unregister(&authenticator).unwrap();
        assert_eq!(coordinator.state(), ActivationState::Repository);
    }

    #[test]
    fn test_losing_everything_goes_inactive() {
        let registry = Arc::new(InMemoryRegistry::new());
        let repository = publish(&registry, Dependency::Repository);
        let coordinator = coordinator(&registry, None);

        registry.unregister(&repository).unwrap();
        assert_eq!(coordinator.state(), ActivationState::Inactive);
        assert!(active_provider_id(&registry).is_none());
    }

    #[test]
    fn test_forced_repository_ignores_authentication() {
        let registry = Arc::new(InMemoryRegistry::new());
        publish(&registry, Dependency::AuthSupport);
        publish(&registry, Dependency::Authenticator);
        let coordinator = coordinator(&registry, Some("jcrAuth"));
        assert_eq!(coordinator.preference(), Preference::Repository);
        assert_eq!(coordinator.state(), ActivationState::Inactive);

        publish(&registry, Dependency::Repository);
        assert_eq!(coordinator.state(), ActivationState::Repository);
    }

    #[test]
    fn test_forced_authentication_ignores_repository() {
        let registry = Arc::new(InMemoryRegistry::new());
        publish(&registry, Dependency::Repository);
        let coordinator = coordinator(&registry, Some("slingAuth"));
        assert_eq!(coordinator.state(), ActivationState::Inactive);

        publish(&registry, Dependency::AuthSupport);
        publish(&registry, Dependency::Authenticator);
        assert_eq!(coordinator.state(), ActivationState::Authentication);
    }

    #[test]
    fn test_invalid_auth_type_uses_default() {
        let registry = Arc::new(InMemoryRegistry::new());
        publish(&registry, Dependency::Repository);
        let coordinator = coordinator(&registry, Some("kerberos"));
        assert_eq!(coordinator.preference(), Preference::Default);
        assert_eq!(coordinator.state(), ActivationState::Repository);
    }

    #[test]
    fn test_repeated_notification_is_noop() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitor = ProviderMonitor::attach(&registry);
        publish(&registry, Dependency::Repository);
        let coordinator = coordinator(&registry, None);
        assert_eq!(monitor.registered(), 1);

        assert_eq!(
            coordinator.on_dependency_changed().unwrap(),
            ActivationState::Repository
        );
        assert_eq!(
            coordinator.on_dependency_changed().unwrap(),
            ActivationState::Repository
        );

        assert_eq!(monitor.registered(), 1);
        assert_eq!(monitor.unregistered(), 0);
    }

    #[test]
    fn test_superseding_dependency_keeps_provider() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitor = ProviderMonitor::attach(&registry);
        publish(&registry, Dependency::Repository);
        let coordinator = coordinator(&registry, None);

        let mut props = Properties::new();
        props.insert(SERVICE_RANKING.into(), json!(100));
        let better = registry
            .register(&[Dependency::Repository.interface()], Arc::new("better"), props)
            .unwrap();

        assert_eq!(
            coordinator.watcher(Dependency::Repository).current_reference(),
            Some(better.reference().clone())
        );
        assert_eq!(coordinator.state(), ActivationState::Repository);
        assert_eq!(monitor.registered(), 1);
    }

    #[test]
    fn test_deactivate_tears_everything_down() {
        let registry = Arc::new(InMemoryRegistry::new());
        let monitor = ProviderMonitor::attach(&registry);
        let deps: Vec<Registration> = Dependency::ALL
            .into_iter()
            .map(|d| publish(&registry, d))
            .collect();
        let coordinator = coordinator(&registry, None);
        assert_eq!(registry.subscription_count(), 4);

        coordinator.deactivate().unwrap();

        assert_eq!(coordinator.state(), ActivationState::Inactive);
        assert!(coordinator.active_registration().is_none());
        assert_eq!(registry.subscription_count(), 1); // the monitor
        assert!(active_provider_id(&registry).is_none());
        assert_eq!(monitor.unregistered(), 1);
        for reg in &deps {
            assert_eq!(registry.use_count(reg.reference()), 0);
        }

        // later changes are ignored and a second deactivate is harmless
        publish(&registry, Dependency::Repository);
        assert_eq!(coordinator.on_dependency_changed().unwrap(), ActivationState::Inactive);
        coordinator.deactivate().unwrap();
        assert_eq!(monitor.registered(), 1);
    }

    #[test]
    fn test_drop_withdraws_provider() {
        let registry = Arc::new(InMemoryRegistry::new());
        let repo = publish(&registry, Dependency::Repository);
        let coordinator = coordinator(&registry, None);
        assert!(active_provider_id(&registry).is_some());

        drop(coordinator);

        assert!(active_provider_id(&registry).is_none());
        assert_eq!(registry.subscription_count(), 0);
        assert_eq!(registry.use_count(repo.reference()), 0);
    }

    #[test]
    fn test_status_reports_availability() {
        let registry = Arc::new(InMemoryRegistry::new());
        let repo = publish(&registry, Dependency::Repository);
        let coordinator = coordinator(&registry, Some("jcrAuth"));

        let status = coordinator.status();
        assert_eq!(status.preference, Preference::Repository);
        assert_eq!(status.state, ActivationState::Repository);
        let repo_status = status
            .dependencies
            .iter()
            .find(|d| d.dependency == Dependency::Repository)
            .unwrap();
        assert!(repo_status.available);
        assert_eq!(repo_status.service_id, Some(repo.id()));
        assert_eq!(status.dependencies.iter().filter(|d| d.available).count(), 1);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["preference"], "jcrAuth");
        assert_eq!(json["state"], "repository");
    }

    #[test]
    fn test_concurrent_changes_never_publish_two_providers() {
        for _ in 0..20 {
            let registry = Arc::new(InMemoryRegistry::new());
            let monitor = ProviderMonitor::attach(&registry);
            let coordinator = coordinator(&registry, None);

            thread::scope(|s| {
                for dependency in Dependency::ALL {
                    let registry = &registry;
                    s.spawn(move || {
                        for _ in 0..10 {
                            let reg = publish(registry, dependency);
                            registry.unregister(&reg).unwrap();
                        }
                        publish(registry, dependency);
                    });
                }
            });

            assert_eq!(monitor.max_live(), 1);
            assert_eq!(coordinator.state(), ActivationState::Authentication);
            assert_eq!(registry.references(SECURITY_PROVIDER_INTERFACE).len(), 1);
            coordinator.deactivate().unwrap();
            assert!(registry.references(SECURITY_PROVIDER_INTERFACE).is_empty());
        }
    }

    /// Registry wrapper whose provider registrations can be made to fail.
    /// Dependencies are published on `inner` directly.
    struct FlakyRegistry {
        inner: InMemoryRegistry,
        fail_register: std::sync::atomic::AtomicBool,
        fail_unregister: std::sync::atomic::AtomicBool,
    }

    impl FlakyRegistry {
        fn new() -> Self {
            Self {
                inner: InMemoryRegistry::new(),
                fail_register: false.into(),
                fail_unregister: false.into(),
            }
        }
    }

    impl ServiceRegistry for FlakyRegistry {
        fn subscribe(
            &self,
            filter: ServiceFilter,
            listener: Arc<dyn ServiceListener>,
        ) -> RegistryResult<SubscriptionId> {
            self.inner.subscribe(filter, listener)
        }

        fn unsubscribe(&self, id: SubscriptionId) -> RegistryResult<()> {
            self.inner.unsubscribe(id)
        }

        fn lookup(&self, interface: &str) -> RegistryResult<Option<ServiceReference>> {
            self.inner.lookup(interface)
        }

        fn get_service(
            &self,
            reference: &ServiceReference,
        ) -> RegistryResult<Option<ServiceObject>> {
            self.inner.get_service(reference)
        }

        fn unget_service(&self, reference: &ServiceReference) -> RegistryResult<()> {
            self.inner.unget_service(reference)
        }

        fn register(
            &self,
            interfaces: &[&str],
            service: ServiceObject,
            properties: Properties,
        ) -> RegistryResult<Registration> {
            if interfaces.contains(&SECURITY_PROVIDER_INTERFACE)
                && self.fail_register.load(Ordering::SeqCst)
            {
                return Err(RegistryError::rejected("registration refused"));
            }
            self.inner.register(interfaces, service, properties)
        }

        fn unregister(&self, registration: &Registration) -> RegistryResult<()> {
            if self.fail_unregister.load(Ordering::SeqCst) {
                return Err(RegistryError::rejected("unregistration refused"));
            }
            self.inner.unregister(registration)
        }
    }

    #[test]
    fn test_failed_registration_leaves_no_phantom_state() {
        let registry = Arc::new(FlakyRegistry::new());
        registry.fail_register.store(true, Ordering::SeqCst);
        let coordinator =
            ServiceCoordinator::new(registry.clone(), None, Arc::new(DefaultProviderFactory))
                .unwrap();

        // the watcher logs the failure; the coordinator stays inactive
        publish(&registry.inner, Dependency::Repository);
        assert!(coordinator.watcher(Dependency::Repository).is_available());
        assert_eq!(coordinator.state(), ActivationState::Inactive);
        assert!(matches!(
            coordinator.on_dependency_changed(),
            Err(crate::FrameworkError::Registry(RegistryError::Rejected(_)))
        ));
        assert_eq!(coordinator.state(), ActivationState::Inactive);

        // the next attempt succeeds without any retry loop
        registry.fail_register.store(false, Ordering::SeqCst);
        assert_eq!(
            coordinator.on_dependency_changed().unwrap(),
            ActivationState::Repository
        );
    }

    #[test]
    fn test_failed_unregistration_keeps_provider_active() {
        let registry = Arc::new(FlakyRegistry::new());
        let repository = publish(&registry.inner, Dependency::Repository);
        let coordinator =
            ServiceCoordinator::new(registry.clone(), None, Arc::new(DefaultProviderFactory))
                .unwrap();
        assert_eq!(coordinator.state(), ActivationState::Repository);
        let active = coordinator.active_registration().unwrap();

        registry.fail_unregister.store(true, Ordering::SeqCst);
        registry.inner.unregister(&repository).unwrap();
        assert!(!coordinator.watcher(Dependency::Repository).is_available());

        // the provider is still registered, so it is still reported
        assert!(matches!(
            coordinator.on_dependency_changed(),
            Err(crate::FrameworkError::Registry(RegistryError::Rejected(_)))
        ));
        assert_eq!(coordinator.state(), ActivationState::Repository);
        assert_eq!(coordinator.active_registration(), Some(active));
        assert_eq!(registry.inner.references(SECURITY_PROVIDER_INTERFACE).len(), 1);

        registry.fail_unregister.store(false, Ordering::SeqCst);
        assert_eq!(
            coordinator.on_dependency_changed().unwrap(),
            ActivationState::Inactive
        );
        assert!(coordinator.active_registration().is_none());
        assert!(registry.inner.references(SECURITY_PROVIDER_INTERFACE).is_empty());
    }
}
