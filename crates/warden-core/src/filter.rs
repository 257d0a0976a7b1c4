//! Subscription filters.
//!
//! Only the equality subset of LDAP filter syntax is supported, which is all
//! a dependency watcher needs:
//!
//! ```text
//! (objectClass=javax.jcr.Repository)
//! (service.vendor=Example)
//! ```
//!
//! `objectClass` matches against the interfaces a service was published
//! under; any other key is compared with the string form of the property.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{RegistryError, RegistryResult};
use crate::properties::OBJECT_CLASS;
use crate::reference::ServiceReference;

/// A parsed `(key=value)` filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceFilter {
    key: String,
    value: String,
}

impl ServiceFilter {
    /// Parses a filter expression.
    pub fn parse(expr: &str) -> RegistryResult<Self> {
        let invalid = |reason: &str| RegistryError::invalid_filter(expr, reason);

        let body = expr
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| invalid("expected '(key=value)'"))?;

        if body.contains(['(', ')']) {
            return Err(invalid("nested or compound filters are not supported"));
        }
        if body.contains('*') {
            return Err(invalid("wildcards are not supported"));
        }

        let (key, value) = body
            .split_once('=')
            .ok_or_else(|| invalid("missing '='"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        if key.contains(char::is_whitespace) {
            return Err(invalid("key must not contain whitespace"));
        }
        if value.is_empty() {
            return Err(invalid("empty value"));
        }

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Builds the `(objectClass=<interface>)` filter.
    pub fn for_interface(interface: &str) -> RegistryResult<Self> {
        Self::parse(&format!("({OBJECT_CLASS}={interface})"))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns `true` if `reference` satisfies this filter.
    pub fn matches(&self, reference: &ServiceReference) -> bool {
        if self.key == OBJECT_CLASS {
            return reference.provides(&self.value);
        }
        match reference.property(&self.key) {
            Some(Value::String(s)) => *s == self.value,
            Some(Value::Array(items)) => items.iter().any(|v| match v {
                Value::String(s) => *s == self.value,
                other => other.to_string() == self.value,
            }),
            Some(other) => other.to_string() == self.value,
            None => false,
        }
    }
}

impl FromStr for ServiceFilter {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServiceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}={})", self.key, self.value)
    }
}
