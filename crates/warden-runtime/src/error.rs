//! Runtime error types.

use thiserror::Error;
use warden_framework::FrameworkError;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The coordinator failed to start or stop.
    #[error("Coordinator error: {0}")]
    Framework(#[from] FrameworkError),

    /// Shutdown signal handlers could not be installed.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
