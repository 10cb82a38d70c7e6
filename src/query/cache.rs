// src/query/cache.rs

//! Keyed query cache with staleness, garbage collection, retry and
//! request deduplication.
//!
//! Every entry holds the last successful value for its key plus at most one
//! in-flight fetch. Callers asking for the same key while a fetch runs share
//! that fetch instead of starting another. Fetches run as spawned tasks, so
//! a result still lands in the cache when the caller that started it is
//! dropped; only the delivery to that caller is lost.
//!
//! The entry map sits behind a `std::sync::Mutex` that is never held across
//! an `.await`.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::task::JoinHandle;

use crate::error::ApiError;
use crate::models::CacheConfig;
use crate::query::clock::{Clock, SystemClock};
use crate::query::key::QueryKey;

/// Type-erased cached value.
pub type QueryValue = Arc<dyn Any + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<QueryValue, ApiError>>>;

/// How a read treats cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Serve fresh cached data; fetch only on a miss or when stale.
    CacheFirst,
    /// Serve any cached data immediately and always revalidate in the
    /// background (refetch on mount).
    #[default]
    CacheThenRevalidate,
    /// Always wait for the network.
    NetworkOnly,
}

/// Per-read cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Age after which cached data is stale
    pub stale_time: Duration,
    /// Idle time after which an unused entry is evicted
    pub gc_time: Duration,
    /// Extra attempts after a failed fetch
    pub retry: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    pub policy: FetchPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            gc_time: Duration::from_secs(10 * 60),
            retry: 1,
            retry_delay: Duration::from_secs(1),
            policy: FetchPolicy::CacheThenRevalidate,
        }
    }
}

impl QueryOptions {
    /// Read defaults from the `[cache]` config section.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            stale_time: Duration::from_secs(config.stale_time_secs),
            gc_time: Duration::from_secs(config.gc_time_secs),
            retry: config.retry,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            policy: if config.refetch_on_mount {
                FetchPolicy::CacheThenRevalidate
            } else {
                FetchPolicy::CacheFirst
            },
        }
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Where the data in a [`QueryResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Cache,
    Network,
}

/// Outcome of a cached read.
pub struct QueryResult<T> {
    pub data: Arc<T>,
    pub source: DataSource,
    /// Data was past its stale time (or invalidated) when served
    pub is_stale: bool,
    refresh: Option<Refresh<T>>,
}

impl<T: Send + Sync + 'static> QueryResult<T> {
    /// A background revalidation was started or joined for this read.
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_some()
    }

    /// Wait for the background revalidation, if any, and return its data.
    ///
    /// Without a pending refresh this is the data already held.
    pub async fn refreshed(self) -> Result<Arc<T>, ApiError> {
        match self.refresh {
            Some(refresh) => refresh.wait().await,
            None => Ok(self.data),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("data", &self.data)
            .field("source", &self.source)
            .field("is_stale", &self.is_stale)
            .field("refreshing", &self.refresh.is_some())
            .finish()
    }
}

/// Handle on a background revalidation.
struct Refresh<T> {
    fetch: SharedFetch,
    _value: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Refresh<T> {
    fn new(fetch: SharedFetch) -> Self {
        Self {
            fetch,
            _value: PhantomData,
        }
    }

    async fn wait(self) -> Result<Arc<T>, ApiError> {
        downcast(self.fetch.await?)
    }
}

fn downcast<T: Send + Sync + 'static>(value: QueryValue) -> Result<Arc<T>, ApiError> {
    value
        .downcast::<T>()
        .map_err(|_| ApiError::request(format!("cached value is not a {}", type_name::<T>())))
}

struct Entry {
    data: Option<QueryValue>,
    updated_at: Option<Instant>,
    invalidated: bool,
    /// Bumped on every invalidation; a fetch started before the bump does
    /// not clear the flag.
    epoch: u64,
    in_flight: Option<(u64, SharedFetch)>,
    last_used: Instant,
    gc_time: Duration,
}

impl Entry {
    fn new(now: Instant, gc_time: Duration) -> Self {
        Self {
            data: None,
            updated_at: None,
            invalidated: false,
            epoch: 0,
            in_flight: None,
            last_used: now,
            gc_time,
        }
    }

    fn is_stale(&self, now: Instant, stale_time: Duration) -> bool {
        self.invalidated
            || self
                .updated_at
                .is_none_or(|at| now.duration_since(at) >= stale_time)
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.in_flight.is_none() && now.duration_since(self.last_used) >= self.gc_time
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<QueryKey, Entry>,
    next_fetch_id: u64,
}

impl State {
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }
}

struct Inner {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
    defaults: QueryOptions,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a finished fetch, unless the entry was removed or a newer
    /// fetch replaced this one.
    fn settle(
        &self,
        key: &QueryKey,
        fetch_id: u64,
        epoch: u64,
        result: &Result<QueryValue, ApiError>,
    ) {
        let now = self.clock.now();
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            log::debug!("Discarding result for evicted query {key}");
            return;
        };
        if entry.in_flight.as_ref().map(|(id, _)| *id) != Some(fetch_id) {
            log::debug!("Discarding superseded result for query {key}");
            return;
        }
        entry.in_flight = None;

        match result {
            Ok(value) => {
                entry.data = Some(Arc::clone(value));
                entry.updated_at = Some(now);
                if entry.epoch == epoch {
                    entry.invalidated = false;
                }
            }
            Err(e) => {
                log::warn!("Query {key} failed: {e}");
            }
        }
    }
}

enum Lookup<T> {
    Fresh(Arc<T>),
    Revalidating {
        data: Arc<T>,
        is_stale: bool,
        fetch: SharedFetch,
    },
    Waiting(SharedFetch),
}

/// Shared query cache handle. Clones refer to the same cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("defaults", &self.inner.defaults)
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl QueryCache {
    pub fn new(defaults: QueryOptions) -> Self {
        Self::with_clock(defaults, Arc::new(SystemClock))
    }

    pub fn with_clock(defaults: QueryOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                clock,
                defaults,
            }),
        }
    }

    /// Options used when a caller has none of its own.
    pub fn defaults(&self) -> &QueryOptions {
        &self.inner.defaults
    }

    /// Read `key` through the cache.
    ///
    /// `fetcher` is only called when the policy and the entry's freshness
    /// require a fetch and no fetch for `key` is already running. A failed
    /// fetch is retried `options.retry` times; earlier cached data is kept
    /// on failure.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> Result<QueryResult<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (lookup, started) = self.lookup(&key, options, fetcher);
        if let Some(fetch) = started {
            tokio::spawn(fetch);
        }

        match lookup {
            Lookup::Fresh(data) => Ok(QueryResult {
                data,
                source: DataSource::Cache,
                is_stale: false,
                refresh: None,
            }),
            Lookup::Revalidating {
                data,
                is_stale,
                fetch,
            } => Ok(QueryResult {
                data,
                source: DataSource::Cache,
                is_stale,
                refresh: Some(Refresh::new(fetch)),
            }),
            Lookup::Waiting(fetch) => {
                let data = downcast(fetch.await?)?;
                Ok(QueryResult {
                    data,
                    source: DataSource::Network,
                    is_stale: false,
                    refresh: None,
                })
            }
        }
    }

    fn lookup<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> (Lookup<T>, Option<SharedFetch>)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let now = self.inner.clock.now();
        let mut state = self.inner.lock();
        let evicted = state.sweep(now);
        if evicted > 0 {
            log::debug!("Evicted {evicted} idle queries");
        }

        let fetch_id = state.next_fetch_id;
        state.next_fetch_id += 1;

        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now, options.gc_time));
        entry.last_used = now;
        entry.gc_time = options.gc_time;

        let cached = entry.data.clone().and_then(|value| match value.downcast::<T>() {
            Ok(data) => Some(data),
            Err(_) => {
                log::warn!(
                    "Query {key} holds a value of another type than {}; refetching",
                    type_name::<T>()
                );
                None
            }
        });
        let is_stale = entry.is_stale(now, options.stale_time);

        if let (FetchPolicy::CacheFirst, Some(data)) = (options.policy, &cached) {
            if !is_stale {
                return (Lookup::Fresh(Arc::clone(data)), None);
            }
        }

        let (fetch, started) = match &entry.in_flight {
            Some((_, running)) => (running.clone(), None),
            None => {
                log::debug!("Fetching query {key}");
                let fetch = self.start_fetch(key.clone(), fetch_id, entry.epoch, options, fetcher);
                entry.in_flight = Some((fetch_id, fetch.clone()));
                (fetch.clone(), Some(fetch))
            }
        };

        let lookup = match (options.policy, cached) {
            (FetchPolicy::NetworkOnly, _) | (_, None) => Lookup::Waiting(fetch),
            (_, Some(data)) => Lookup::Revalidating {
                data,
                is_stale,
                fetch,
            },
        };
        (lookup, started)
    }

    fn start_fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        fetch_id: u64,
        epoch: u64,
        options: &QueryOptions,
        fetcher: F,
    ) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let cache: Weak<Inner> = Arc::downgrade(&self.inner);
        let retries = options.retry;
        let delay = options.retry_delay;

        async move {
            let result = with_retry(&key, &fetcher, retries, delay)
                .await
                .map(|value| Arc::new(value) as QueryValue);
            if let Some(inner) = cache.upgrade() {
                inner.settle(&key, fetch_id, epoch, &result);
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Run a write. Never retried; on success every entry under each prefix
    /// in `invalidates` is marked stale.
    pub async fn mutate<T, Fut>(
        &self,
        mutation: Fut,
        invalidates: &[QueryKey],
    ) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match mutation.await {
            Ok(value) => {
                for prefix in invalidates {
                    self.invalidate_queries(prefix);
                }
                Ok(value)
            }
            Err(e) => {
                log::warn!("Mutation failed: {e}");
                Err(e)
            }
        }
    }

    /// Cached value for `key`, fresh or not.
    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let state = self.inner.lock();
        let value = state.entries.get(key)?.data.clone()?;
        value.downcast::<T>().ok()
    }

    /// Store `value` under `key` as freshly fetched data.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        let now = self.inner.clock.now();
        let gc_time = self.inner.defaults.gc_time;
        let mut state = self.inner.lock();
        let entry = state
            .entries
            .entry(key)
            .or_insert_with(|| Entry::new(now, gc_time));
        entry.data = Some(Arc::new(value));
        entry.updated_at = Some(now);
        entry.invalidated = false;
        entry.last_used = now;
    }

    /// Mark every entry under `prefix` stale. Returns how many matched.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let mut state = self.inner.lock();
        let mut count = 0;
        for (_, entry) in state.entries.iter_mut().filter(|(k, _)| k.starts_with(prefix)) {
            entry.invalidated = true;
            entry.epoch += 1;
            count += 1;
        }
        log::debug!("Invalidated {count} queries under {prefix}");
        count
    }

    /// Drop every entry under `prefix`. Running fetches for them are not
    /// cancelled but their results are discarded.
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let mut state = self.inner.lock();
        let before = state.entries.len();
        state.entries.retain(|k, _| !k.starts_with(prefix));
        before - state.entries.len()
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|e| e.in_flight.is_some())
    }

    /// Evict entries idle for longer than their gc time. Entries with a
    /// running fetch are kept.
    pub fn sweep(&self) -> usize {
        let now = self.inner.clock.now();
        let evicted = self.inner.lock().sweep(now);
        if evicted > 0 {
            log::debug!("Evicted {evicted} idle queries");
        }
        evicted
    }

    /// Sweep every `period` until the last cache handle is dropped.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(&self.inner);
        let period = period.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = cache.upgrade() else {
                    break;
                };
                QueryCache { inner }.sweep();
            }
        })
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn with_retry<T, F, Fut>(
    key: &QueryKey,
    fetcher: &F,
    retries: u32,
    delay: Duration,
) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                attempt += 1;
                log::warn!("Query {key} failed ({e}); retry {attempt}/{retries}");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => return Err(e),
        }
    }
}
