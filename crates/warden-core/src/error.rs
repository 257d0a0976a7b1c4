//! Error types for the registry boundary.
//!
//! Higher layers wrap [`RegistryError`] in their own error enums; nothing in
//! this crate recovers from a registry failure locally.

use thiserror::Error;

use crate::reference::ServiceId;
use crate::registry::SubscriptionId;

/// Errors reported by a [`ServiceRegistry`](crate::ServiceRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The subscription filter could not be parsed.
    #[error("invalid service filter '{filter}': {reason}")]
    InvalidFilter {
        /// The offending filter expression.
        filter: String,
        /// Why the filter was rejected.
        reason: String,
    },

    /// The subscription id is not (or no longer) known to the registry.
    #[error("unknown subscription {0}")]
    UnknownSubscription(SubscriptionId),

    /// The registration was already removed or never existed.
    #[error("unknown service registration {0}")]
    UnknownRegistration(ServiceId),

    /// A service must be published under at least one interface.
    #[error("a service must be registered under at least one interface")]
    EmptyInterfaces,

    /// The host registry refused the operation.
    #[error("registry rejected the operation: {0}")]
    Rejected(String),
}

impl RegistryError {
    /// Creates an invalid-filter error.
    pub fn invalid_filter(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            filter: filter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
