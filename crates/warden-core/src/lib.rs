//! # Warden Core
//!
//! The registry boundary of the Warden dependency coordinator.
//!
//! Everything the coordinator knows about its host is expressed through the
//! [`ServiceRegistry`] trait:
//!
//! - **References**: [`ServiceReference`] snapshots with a total priority
//!   order (ranking, then age).
//! - **Subscriptions**: [`ServiceFilter`] + [`ServiceListener`], delivering
//!   [`ServiceEvent`]s.
//! - **Handles**: type-erased [`ServiceObject`]s acquired with
//!   `get_service` and returned with `unget_service`.
//! - **Publication**: `register` / `unregister` returning a [`Registration`].
//!
//! [`InMemoryRegistry`] is a complete implementation for single-process use
//! and for tests.
//!
//! ```text
//! ┌──────────────┐  ServiceEvent   ┌──────────────┐
//! │   Registry   │────────────────▶│   Listener   │
//! │ (host / mem) │◀────────────────│  (watcher)   │
//! └──────────────┘  get / unget    └──────────────┘
//! ```

pub mod error;
pub mod event;
pub mod filter;
pub mod memory;
pub mod properties;
pub mod reference;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use event::{ServiceEvent, ServiceEventKind, ServiceListener};
pub use filter::ServiceFilter;
pub use memory::InMemoryRegistry;
pub use reference::{Properties, ServiceId, ServiceObject, ServiceReference};
pub use registry::{BoxedRegistry, Registration, ServiceRegistry, SubscriptionId};

/// Prelude for common imports.
pub mod prelude {
    pub use super::properties::*;
    pub use super::{
        InMemoryRegistry, Properties, Registration, ServiceEvent, ServiceEventKind,
        ServiceFilter, ServiceListener, ServiceObject, ServiceReference, ServiceRegistry,
    };
}
