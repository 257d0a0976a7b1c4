//! Error types for the Warden framework.

use thiserror::Error;
use warden_core::RegistryError;

use crate::dependency::Dependency;

/// Errors raised by watchers and the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameworkError {
    /// A registry call failed. Subscription-filter failures land here too;
    /// they are never recovered.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// `start` was called on a watcher that is already subscribed.
    #[error("watcher for {0} is already started")]
    AlreadyStarted(Dependency),

    /// The configured auth type is not one of the recognised literals.
    #[error("unknown auth type '{0}', expected 'jcrAuth' or 'slingAuth'")]
    UnknownPreference(String),
}

/// Result type for framework operations.
pub type FrameworkResult<T> = Result<T, FrameworkError>;
