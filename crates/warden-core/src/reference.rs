//! Service identities and references.
//!
//! A [`ServiceReference`] is the registry's record of one published service.
//! Consumers never read data through it; it exists so that two observations
//! of a service can be compared for identity and priority.
//!
//! # Ordering
//!
//! References form a total order in which *greater means preferred*:
//!
//! ```text
//! higher service.ranking  ──►  greater
//! equal ranking           ──►  lower service id (older service) is greater
//! same service id         ──►  Equal
//! ```

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::properties::SERVICE_RANKING;

/// Type-erased service instance, as handed out by the registry.
pub type ServiceObject = Arc<dyn Any + Send + Sync>;

/// Service property map attached to a registration.
pub type Properties = Map<String, Value>;

/// Registry-assigned identifier of a published service.
///
/// Ids are allocated in increasing order, so a lower id means the service
/// was published earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub u64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ReferenceInner {
    id: ServiceId,
    ranking: i32,
    interfaces: Box<[String]>,
    properties: Properties,
}

/// Snapshot of a service registration.
///
/// Cloning is cheap. Equality and ordering only look at the id and ranking;
/// see the [module docs](self) for the ordering rules.
#[derive(Clone)]
pub struct ServiceReference {
    inner: Arc<ReferenceInner>,
}

impl ServiceReference {
    /// Creates a reference. The ranking is read from the
    /// [`service.ranking`](SERVICE_RANKING) property and defaults to `0`.
    pub fn new(id: ServiceId, interfaces: Vec<String>, properties: Properties) -> Self {
        let ranking = ranking_of(&properties);
        Self {
            inner: Arc::new(ReferenceInner {
                id,
                ranking,
                interfaces: interfaces.into_boxed_slice(),
                properties,
            }),
        }
    }

    /// The registry-assigned service id.
    pub fn id(&self) -> ServiceId {
        self.inner.id
    }

    /// The service ranking; higher wins.
    pub fn ranking(&self) -> i32 {
        self.inner.ranking
    }

    /// Interfaces the service was published under.
    pub fn interfaces(&self) -> &[String] {
        &self.inner.interfaces
    }

    /// Returns `true` if the service was published under `interface`.
    pub fn provides(&self, interface: &str) -> bool {
        self.inner.interfaces.iter().any(|i| i == interface)
    }

    /// All registration properties.
    pub fn properties(&self) -> &Properties {
        &self.inner.properties
    }

    /// A single registration property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.inner.properties.get(key)
    }
}

fn ranking_of(properties: &Properties) -> i32 {
    properties
        .get(SERVICE_RANKING)
        .and_then(Value::as_i64)
        .and_then(|r| i32::try_from(r).ok())
        .unwrap_or(0)
}

impl PartialEq for ServiceReference {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ServiceReference {}

impl PartialOrd for ServiceReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceReference {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.inner.id == other.inner.id {
            return Ordering::Equal;
        }
        self.inner
            .ranking
            .cmp(&other.inner.ranking)
            .then_with(|| other.inner.id.cmp(&self.inner.id))
    }
}

impl fmt::Debug for ServiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceReference")
            .field("id", &self.inner.id)
            .field("ranking", &self.inner.ranking)
            .field("interfaces", &self.inner.interfaces)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ServiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] (ranking {})",
            self.inner.id,
            self.inner.interfaces.join(", "),
            self.inner.ranking
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reference(id: u64, ranking: Option<i64>) -> ServiceReference {
        let mut props = Properties::new();
        if let Some(r) = ranking {
            props.insert(SERVICE_RANKING.into(), json!(r));
        }
        ServiceReference::new(ServiceId(id), vec!["test.Service".into()], props)
    }

    #[test]
    fn test_higher_ranking_wins() {
        let low = reference(1, Some(0));
        let high = reference(2, Some(10));
        assert!(high > low);
        assert_eq!(std::cmp::max(low.clone(), high.clone()).id(), ServiceId(2));
    }

    #[test]
    fn test_equal_ranking_prefers_older_service() {
        let older = reference(3, None);
        let newer = reference(7, None);
        assert!(older > newer);
    }

    #[test]
    fn test_same_id_is_equal() {
        let a = reference(5, Some(1));
        let b = reference(5, Some(1));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_ranking_defaults_to_zero_for_bad_values() {
        let mut props = Properties::new();
        props.insert(SERVICE_RANKING.into(), json!("high"));
        let r = ServiceReference::new(ServiceId(1), vec!["x".into()], props);
        assert_eq!(r.ranking(), 0);

        let mut props = Properties::new();
        props.insert(SERVICE_RANKING.into(), json!(i64::MAX));
        let r = ServiceReference::new(ServiceId(2), vec!["x".into()], props);
        assert_eq!(r.ranking(), 0);
    }

    #[test]
    fn test_provides() {
        let r = reference(1, None);
        assert!(r.provides("test.Service"));
        assert!(!r.provides("other.Service"));
    }
}
