//! Well-known service property keys.

/// Interfaces a service is registered under; also the filter key used to
/// select services by interface.
pub const OBJECT_CLASS: &str = "objectClass";

/// Registry-assigned service id.
pub const SERVICE_ID: &str = "service.id";

/// Integer ranking; the highest ranked service is preferred.
pub const SERVICE_RANKING: &str = "service.ranking";

/// Stable persistent identifier of a service.
pub const SERVICE_PID: &str = "service.pid";

/// Human-readable description.
pub const SERVICE_DESCRIPTION: &str = "service.description";

/// Vendor tag.
pub const SERVICE_VENDOR: &str = "service.vendor";
