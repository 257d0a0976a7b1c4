//! Warden Runtime - configuration, logging and lifecycle for the coordinator.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `WardenConfig`)
//! - Logging configuration (`LoggingBuilder`)
//! - Runtime orchestration (`WardenRuntime`)
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_core::InMemoryRegistry;
//! use warden_runtime::WardenRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = WardenRuntime::builder().build(Arc::new(InMemoryRegistry::new()))?;
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LoggingConfig, Profile, WardenConfig,
    WebConsoleConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RuntimeBuilder, WardenRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, span, trace, warn};
}
