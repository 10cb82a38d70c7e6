// src/query/mod.rs

//! Query cache layer.
//!
//! - [`QueryCache`]: keyed cache with staleness, gc, retry and dedup
//! - [`keys`]: key factory per resource
//! - [`CatalogQueries`]: catalog reads and writes bound to the cache

mod cache;
mod clock;
mod hooks;
mod key;

pub use cache::{DataSource, FetchPolicy, QueryCache, QueryOptions, QueryResult, QueryValue};
pub use clock::{Clock, ManualClock, SystemClock};
pub use hooks::{CatalogQueries, SPECIALTY_STALE_TIME};
pub use key::{KeySegment, QueryKey};

/// Cache key factories.
pub mod keys {
    pub use super::key::{ai, specialties, universities};
}
