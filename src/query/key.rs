// src/query/key.rs

//! Hierarchical cache keys and the key factory for each resource.
//!
//! A key is an ordered list of segments: resource, operation, then either an
//! identifier or the full parameter set. Keys are only compared and hashed;
//! prefix matching drives invalidation (`["universities"]` covers every
//! university list, detail and search).

use std::fmt;

use serde::Serialize;

/// One element of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySegment {
    /// A resource, operation, identifier or search term
    Name(String),
    /// Canonical JSON of a parameter set
    Params(String),
}

/// Structured cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    /// Single-segment key for a resource.
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![KeySegment::Name(name.into())])
    }

    /// Append a name segment.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.0.push(KeySegment::Name(name.into()));
        self
    }

    /// Append a parameter segment.
    ///
    /// Parameters are encoded as JSON with object keys sorted, so two
    /// parameter sets collide only if they serialize identically.
    pub fn with_params<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        let encoded = serde_json::to_value(params)
            .map(|value| value.to_string())
            .unwrap_or_else(|e| format!("!unserializable:{e}"));
        self.0.push(KeySegment::Params(encoded));
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Whether `prefix` is a leading part of this key (or equal to it).
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match segment {
                KeySegment::Name(name) => write!(f, "{name:?}")?,
                KeySegment::Params(json) => f.write_str(json)?,
            }
        }
        f.write_str("]")
    }
}

/// University keys.
pub mod universities {
    use super::QueryKey;
    use crate::models::UniversityListParams;

    pub fn all() -> QueryKey {
        QueryKey::root("universities")
    }

    pub fn lists() -> QueryKey {
        all().with("list")
    }

    pub fn list(params: &UniversityListParams) -> QueryKey {
        lists().with_params(params)
    }

    pub fn details() -> QueryKey {
        all().with("detail")
    }

    pub fn detail(id: &str) -> QueryKey {
        details().with(id)
    }

    pub fn search(query: &str) -> QueryKey {
        all().with("search").with(query)
    }
}

/// Specialty keys.
pub mod specialties {
    use super::QueryKey;
    use crate::models::SpecialtyListParams;

    pub fn all() -> QueryKey {
        QueryKey::root("specialties")
    }

    pub fn lists() -> QueryKey {
        all().with("list")
    }

    pub fn list(params: &SpecialtyListParams) -> QueryKey {
        lists().with_params(params)
    }

    pub fn detail(id: &str) -> QueryKey {
        all().with("detail").with(id)
    }

    pub fn search(query: &str) -> QueryKey {
        all().with("search").with(query)
    }
}

/// Assistant keys.
pub mod ai {
    use super::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::root("ai")
    }

    pub fn health() -> QueryKey {
        all().with("health")
    }
}
