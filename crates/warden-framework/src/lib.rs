//! # Warden Framework
//!
//! Dependency tracking and security-provider coordination on top of
//! [`warden_core`].
//!
//! This layer provides:
//! - [`DependencyWatcher`]: keeps the best-ranked service of one interface
//!   acquired and reports availability changes
//! - [`ServiceCoordinator`]: decides which security provider should be
//!   published and performs the unregister/register transitions
//! - [`Preference`]: the operator's auth-type choice
//! - [`ProviderFactory`]: the seam where hosts plug in their providers

pub mod coordinator;
pub mod dependency;
pub mod error;
pub mod preference;
pub mod provider;
pub mod state;
pub mod watcher;

pub use coordinator::{CoordinatorStatus, DependencyStatus, ServiceCoordinator};
pub use dependency::Dependency;
pub use error::{FrameworkError, FrameworkResult};
pub use preference::Preference;
pub use provider::{
    AuthenticationProvider, DefaultProviderFactory, ProviderDescriptor, ProviderFactory,
    RepositoryProvider,
};
pub use state::{ActivationState, target_state};
pub use watcher::{DependencyListener, DependencyWatcher};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        ActivationState, DefaultProviderFactory, Dependency, FrameworkError, FrameworkResult,
        Preference, ProviderFactory, ServiceCoordinator,
    };
}
