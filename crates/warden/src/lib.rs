//! # Warden
//!
//! Dynamic dependency coordination for web console security providers.
//!
//! ## Overview
//!
//! Warden watches a service registry for three dependencies and keeps exactly
//! one web console security provider published, or none:
//!
//! - the **repository-backed** provider needs the repository;
//! - the **authentication-backed** provider needs the authentication support
//!   *and* the authenticator.
//!
//! With no configured preference the authentication-backed provider wins
//! whenever both of its dependencies are present. `webconsole.auth_type`
//! (`"jcrAuth"` / `"slingAuth"`) forces one of them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  events   ┌────────────────────┐  changed  ┌──────────────────────┐
//! │   Registry   │──────────▶│ DependencyWatcher  │──────────▶│  ServiceCoordinator  │
//! │ (host / mem) │◀──────────│ × 3                │           │                      │
//! │              │ get/unget └────────────────────┘           │  target_state(...)   │
//! │              │◀─────────────── register / unregister ─────│                      │
//! └──────────────┘                                            └──────────────────────┘
//! ```
//!
//! - **Core** (`warden-core`): the registry boundary and an in-memory registry
//! - **Framework** (`warden-framework`): watchers, preference, coordinator
//! - **Runtime** (`warden-runtime`): configuration, logging, lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(InMemoryRegistry::new());
//!     let runtime = WardenRuntime::builder().build(registry)?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use warden_core as core;
pub use warden_framework as framework;
pub use warden_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    // Runtime - main entry point
    pub use warden_runtime::{WardenConfig, WardenRuntime};

    // Coordination
    pub use warden_framework::{
        ActivationState, DefaultProviderFactory, Dependency, Preference, ProviderFactory,
        ServiceCoordinator,
    };

    // Registry boundary
    pub use warden_core::{
        BoxedRegistry, InMemoryRegistry, Properties, ServiceObject, ServiceReference,
        ServiceRegistry,
    };
}
