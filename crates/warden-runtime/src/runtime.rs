//! Runtime lifecycle around the security-provider coordinator.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_core::InMemoryRegistry;
//! use warden_runtime::WardenRuntime;
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! let runtime = WardenRuntime::builder()
//!     .config_file("config/warden.toml")
//!     .build(registry)?;
//!
//! // Run until Ctrl+C
//! runtime.run().await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use warden_core::BoxedRegistry;
use warden_framework::{
    ActivationState, CoordinatorStatus, DefaultProviderFactory, ProviderFactory,
    ServiceCoordinator,
};

use crate::config::{ConfigLoader, ConfigResult, WardenConfig};
use crate::error::RuntimeResult;
use crate::logging;

/// Owns the configuration and, while running, the coordinator.
///
/// # Custom Configuration
///
/// ```rust,ignore
/// let runtime = WardenRuntime::builder()
///     .profile("production")
///     .provider_factory(Arc::new(MyProviders::new()))
///     .build(registry)?;
///
/// // Or use pre-loaded config
/// let config = load_config_from_file("warden.toml")?;
/// let runtime = WardenRuntime::from_config(&config, registry);
/// ```
pub struct WardenRuntime {
    config: WardenConfig,
    registry: BoxedRegistry,
    factory: Arc<dyn ProviderFactory>,
    /// Present while running.
    coordinator: RwLock<Option<ServiceCoordinator>>,
}

impl WardenRuntime {
    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration with the default providers.
    ///
    /// Initializes logging from `config.logging` unless a subscriber is
    /// already installed.
    pub fn from_config(config: &WardenConfig, registry: BoxedRegistry) -> Self {
        Self::assemble(config, registry, Arc::new(DefaultProviderFactory))
    }

    fn assemble(
        config: &WardenConfig,
        registry: BoxedRegistry,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            auth_type = config.webconsole.auth_type.as_deref().unwrap_or("<unset>"),
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            registry,
            factory,
            coordinator: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn registry(&self) -> &BoxedRegistry {
        &self.registry
    }

    /// Returns whether the runtime is currently running.
    pub async fn is_running(&self) -> bool {
        self.coordinator.read().await.is_some()
    }

    /// Coordinator snapshot, `None` when stopped.
    pub async fn status(&self) -> Option<CoordinatorStatus> {
        self.coordinator
            .read()
            .await
            .as_ref()
            .map(ServiceCoordinator::status)
    }

    /// Current activation state; `Inactive` when stopped.
    pub async fn state(&self) -> ActivationState {
        self.coordinator
            .read()
            .await
            .as_ref()
            .map_or(ActivationState::Inactive, ServiceCoordinator::state)
    }

    /// Starts the coordinator.
    pub async fn start(&self) -> RuntimeResult<()> {
        let mut coordinator = self.coordinator.write().await;
        if coordinator.is_some() {
            warn!("Runtime is already running");
            return Ok(());
        }

        info!("Starting Warden runtime");

        let started = ServiceCoordinator::new(
            Arc::clone(&self.registry),
            self.config.webconsole.auth_type.as_deref(),
            Arc::clone(&self.factory),
        )?;

        let status = started.status();
        for dependency in &status.dependencies {
            debug!(
                dependency = %dependency.dependency,
                available = dependency.available,
                service = ?dependency.service_id,
                "Dependency status"
            );
        }
        info!(
            preference = %status.preference,
            state = %status.state,
            "Runtime started"
        );

        *coordinator = Some(started);
        Ok(())
    }

    /// Stops the coordinator, withdrawing any published provider.
    pub async fn stop(&self) -> RuntimeResult<()> {
        let Some(coordinator) = self.coordinator.write().await.take() else {
            warn!("Runtime is not running");
            return Ok(());
        };

        info!("Stopping Warden runtime");

        if let Err(e) = coordinator.deactivate() {
            error!(error = %e, "Error during coordinator shutdown");
            return Err(e.into());
        }

        info!("Runtime stopped");
        Ok(())
    }

    /// Runs the runtime until a shutdown signal is received.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;

        info!("Warden runtime is now running. Press Ctrl+C to stop.");

        let waited = Self::wait_for_shutdown().await;
        self.stop().await?;
        waited
    }

    /// Runs the runtime with a custom shutdown future.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.start().await?;

        shutdown.await;

        self.stop().await
    }

    /// Waits for shutdown signals (Ctrl+C or SIGTERM).
    async fn wait_for_shutdown() -> RuntimeResult<()> {
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

            tokio::select! {
                result = signal::ctrl_c() => {
                    result?;
                    info!("Received Ctrl+C, shutting down");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await?;
            info!("Received Ctrl+C, shutting down");
        }

        Ok(())
    }
}

impl std::fmt::Debug for WardenRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardenRuntime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a `WardenRuntime` with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    factory: Arc<dyn ProviderFactory>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder using the default config locations.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            factory: Arc::new(DefaultProviderFactory),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: WardenConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `factory` to build the published providers.
    pub fn provider_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Loads the configuration and builds the runtime around `registry`.
    pub fn build(self, registry: BoxedRegistry) -> ConfigResult<WardenRuntime> {
        let config = self.config_loader.load()?;
        Ok(WardenRuntime::assemble(&config, registry, self.factory))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use warden_core::{InMemoryRegistry, Properties, ServiceObject, ServiceRegistry};
    use warden_framework::dependency::REPOSITORY_INTERFACE;
    use warden_framework::provider::SECURITY_PROVIDER_INTERFACE;
    use warden_framework::{Dependency, Preference};

    use crate::config::WebConsoleConfig;

    fn registry_with_repository() -> Arc<InMemoryRegistry> {
        let registry = Arc::new(InMemoryRegistry::new());
        registry
            .register(&[REPOSITORY_INTERFACE], Arc::new("repo"), Properties::new())
            .unwrap();
        registry
    }

    fn published_providers(registry: &InMemoryRegistry) -> usize {
        registry.references(SECURITY_PROVIDER_INTERFACE).len()
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let registry = registry_with_repository();
        let runtime = WardenRuntime::from_config(&WardenConfig::default(), registry.clone());
        assert!(!runtime.is_running().await);
        assert!(runtime.status().await.is_none());

        runtime.start().await.unwrap();
        assert!(runtime.is_running().await);
        assert_eq!(runtime.state().await, ActivationState::Repository);
        assert_eq!(published_providers(&registry), 1);

        runtime.stop().await.unwrap();
        assert!(!runtime.is_running().await);
        assert_eq!(runtime.state().await, ActivationState::Inactive);
        assert_eq!(published_providers(&registry), 0);
        assert_eq!(registry.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_start_twice_and_stop_twice_are_noops() {
        let registry = registry_with_repository();
        let runtime = WardenRuntime::from_config(&WardenConfig::default(), registry.clone());

        runtime.start().await.unwrap();
        runtime.start().await.unwrap();
        assert_eq!(published_providers(&registry), 1);
        assert_eq!(registry.subscription_count(), 3);

        runtime.stop().await.unwrap();
        runtime.stop().await.unwrap();
        assert_eq!(published_providers(&registry), 0);
    }

    #[tokio::test]
    async fn test_configured_auth_type_reaches_coordinator() {
        let registry = registry_with_repository();
        let config = WardenConfig {
            webconsole: WebConsoleConfig {
                auth_type: Some("slingAuth".into()),
            },
            ..Default::default()
        };
        let runtime = WardenRuntime::from_config(&config, registry.clone());

        runtime.start().await.unwrap();
        let status = runtime.status().await.unwrap();
        assert_eq!(status.preference, Preference::Authentication);
        assert_eq!(status.state, ActivationState::Inactive);
        assert!(
            status
                .dependencies
                .iter()
                .any(|d| d.dependency == Dependency::Repository && d.available)
        );
        assert_eq!(published_providers(&registry), 0);
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let registry = registry_with_repository();
        let runtime = WardenRuntime::from_config(&WardenConfig::default(), registry.clone());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let observed = Arc::new(AtomicUsize::new(0));
        let shutdown = {
            let registry = registry.clone();
            let observed = observed.clone();
            async move {
                observed.store(published_providers(&registry), Ordering::SeqCst);
                let _ = rx.await;
            }
        };
        tx.send(()).unwrap();

        runtime.run_until(shutdown).await.unwrap();

        assert_eq!(observed.load(Ordering::SeqCst), 1);
        assert!(!runtime.is_running().await);
        assert_eq!(published_providers(&registry), 0);
    }

    #[tokio::test]
    async fn test_builder_merge_and_factory() {
        struct CountingFactory(AtomicUsize);

        impl ProviderFactory for CountingFactory {
            fn repository_provider(&self, repository: ServiceObject) -> ServiceObject {
                self.0.fetch_add(1, Ordering::SeqCst);
                repository
            }

            fn authentication_provider(
                &self,
                auth_support: ServiceObject,
                _authenticator: ServiceObject,
            ) -> ServiceObject {
                self.0.fetch_add(1, Ordering::SeqCst);
                auth_support
            }
        }

        let registry = registry_with_repository();
        let factory = Arc::new(CountingFactory(AtomicUsize::new(0)));
        let empty_dir = std::env::temp_dir().join(format!("warden-none-{}", std::process::id()));
        let runtime = WardenRuntime::builder()
            .search_path(empty_dir)
            .without_env()
            .merge(WardenConfig {
                webconsole: WebConsoleConfig {
                    auth_type: Some("jcrAuth".into()),
                },
                ..Default::default()
            })
            .provider_factory(factory.clone())
            .build(registry.clone())
            .unwrap();
        assert_eq!(runtime.config().webconsole.auth_type.as_deref(), Some("jcrAuth"));

        runtime.start().await.unwrap();
        assert_eq!(runtime.state().await, ActivationState::Repository);
        assert_eq!(factory.0.load(Ordering::SeqCst), 1);
        runtime.stop().await.unwrap();
    }
}
