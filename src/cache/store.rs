//! Keyed query cache.
//!
//! Each [`QueryCache`] holds the entries of one query kind. Reads go through
//! [`QueryCache::get_or_fetch`]: fresh entries are served directly, stale
//! entries are served while a refresh runs in the background, and missing or
//! invalidated entries wait for a fetch. Concurrent reads of one key share a
//! single fetch, which runs on its own task so dropped readers never cancel it.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc, RwLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures::FutureExt;
use metrics::{counter, histogram};
use tokio::{sync::watch, time::Instant};
use tracing::{debug, info};

use crate::application::error::ApiError;

use super::config::CacheConfig;
use super::inflight::{FetchResult, Fetched, Generation, InFlightFetches, SharedFetch};
use super::keys::{QueryKey, QueryKind};
use super::lock::{rw_read, rw_write};
use super::state::QueryState;

const SOURCE: &str = "cache::store";

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> Generation {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Cache of one query kind, cheap to clone.
pub struct QueryCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<V> {
    kind: QueryKind,
    stale_after: Duration,
    gc_after: Duration,
    entries: RwLock<HashMap<QueryKey, Entry<V>>>,
    inflight: InFlightFetches<V>,
}

struct Entry<V> {
    value: Option<Arc<V>>,
    fetched_at: Option<Instant>,
    last_accessed: Instant,
    invalidated: bool,
    generation: Generation,
    state: watch::Sender<QueryState<V>>,
}

impl<V> Entry<V> {
    fn new(now: Instant) -> Self {
        let (state, _) = watch::channel(QueryState::idle());
        Self {
            value: None,
            fetched_at: None,
            last_accessed: now,
            invalidated: false,
            generation: next_generation(),
            state,
        }
    }

    fn mark_loading(&self) {
        self.state.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            *state = QueryState::loading();
            true
        });
    }
}

enum Lookup<V> {
    Fresh(QueryState<V>),
    Stale {
        state: QueryState<V>,
        generation: Generation,
    },
    Missing {
        generation: Generation,
    },
}

impl<V> QueryCache<V>
where
    V: Send + Sync + 'static,
{
    pub fn new(kind: QueryKind, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                stale_after: config.stale_after(kind),
                gc_after: config.gc,
                entries: RwLock::new(HashMap::new()),
                inflight: InFlightFetches::new(),
            }),
        }
    }

    pub fn kind(&self) -> QueryKind {
        self.inner.kind
    }

    /// Read `key`, fetching it with `fetch` when the cache cannot answer.
    ///
    /// `fetch` is only called when no joinable fetch is outstanding for the key.
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetch: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        self.evict_idle();
        let kind = self.inner.kind.as_str();

        match self.lookup(&key) {
            Lookup::Fresh(state) => {
                counter!("compass_query_cache_hit_total", "kind" => kind).increment(1);
                debug!(cache = kind, key = %key, outcome = "hit", "Served query from cache");
                state
            }
            Lookup::Stale { state, generation } => {
                counter!("compass_query_cache_stale_total", "kind" => kind).increment(1);
                debug!(
                    cache = kind,
                    key = %key,
                    outcome = "stale",
                    "Serving stale query while refreshing"
                );
                drop(self.join_or_start(&key, generation, fetch));
                state
            }
            Lookup::Missing { generation } => {
                counter!("compass_query_cache_miss_total", "kind" => kind).increment(1);
                debug!(cache = kind, key = %key, outcome = "miss", "Fetching query");
                match self.join_or_start(&key, generation, fetch).await {
                    Ok(fetched) => QueryState::success(fetched.value, fetched.at),
                    Err(err) => {
                        let (data, fetched_at) = self.held_value(&key);
                        QueryState::failed(err, data, fetched_at)
                    }
                }
            }
        }
    }

    /// Start a fetch for `key` unless its entry is fresh, without waiting for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn prefetch<F, Fut>(&self, key: QueryKey, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        match self.lookup(&key) {
            Lookup::Fresh(_) => {}
            Lookup::Stale { generation, .. } | Lookup::Missing { generation } => {
                debug!(cache = self.inner.kind.as_str(), key = %key, "Prefetching query");
                drop(self.join_or_start(&key, generation, fetch));
            }
        }
    }

    /// Mark `key` for re-fetch. Returns whether an entry existed.
    ///
    /// A fetch started before the invalidation can no longer write the entry.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let found = {
            let mut entries = rw_write(&self.inner.entries, SOURCE, "invalidate");
            match entries.get_mut(key) {
                Some(entry) => {
                    entry.invalidated = true;
                    entry.generation = next_generation();
                    true
                }
                None => false,
            }
        };
        let had_inflight = self.inner.inflight.forget(key);

        if found {
            let kind = self.inner.kind.as_str();
            counter!("compass_query_cache_invalidate_total", "kind" => kind).increment(1);
            info!(cache = kind, key = %key, had_inflight, "Invalidated query");
        }
        found
    }

    /// Observe state transitions of `key`; registers an idle entry when absent.
    pub fn subscribe(&self, key: QueryKey) -> watch::Receiver<QueryState<V>> {
        self.evict_idle();
        let now = Instant::now();
        let mut entries = rw_write(&self.inner.entries, SOURCE, "subscribe");
        let entry = entries.entry(key).or_insert_with(|| Entry::new(now));
        entry.last_accessed = now;
        entry.state.subscribe()
    }

    pub fn is_observed(&self, key: &QueryKey) -> bool {
        rw_read(&self.inner.entries, SOURCE, "is_observed")
            .get(key)
            .is_some_and(|entry| entry.state.receiver_count() > 0)
    }

    /// Current state of `key` without touching access time or fetching.
    pub fn peek(&self, key: &QueryKey) -> Option<QueryState<V>> {
        rw_read(&self.inner.entries, SOURCE, "peek")
            .get(key)
            .map(|entry| entry.state.borrow().clone())
    }

    pub fn len(&self) -> usize {
        rw_read(&self.inner.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches currently registered as joinable.
    pub fn inflight_len(&self) -> usize {
        self.inner.inflight.len()
    }

    /// Drop entries idle for the GC window that nobody observes or fetches.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let evicted = {
            let mut entries = rw_write(&self.inner.entries, SOURCE, "evict_idle");
            let before = entries.len();
            entries.retain(|key, entry| {
                now.saturating_duration_since(entry.last_accessed) < self.inner.gc_after
                    || entry.state.receiver_count() > 0
                    || self.inner.inflight.contains(key)
            });
            before - entries.len()
        };

        if evicted > 0 {
            let kind = self.inner.kind.as_str();
            counter!("compass_query_cache_evict_total", "kind" => kind).increment(evicted as u64);
            debug!(cache = kind, evicted, "Evicted idle queries");
        }
        evicted
    }

    fn lookup(&self, key: &QueryKey) -> Lookup<V> {
        let now = Instant::now();
        let mut entries = rw_write(&self.inner.entries, SOURCE, "lookup");
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now));
        entry.last_accessed = now;

        match (&entry.value, entry.fetched_at) {
            (Some(value), Some(at)) if !entry.invalidated => {
                let state = QueryState::success(Arc::clone(value), at);
                if now.saturating_duration_since(at) > self.inner.stale_after {
                    Lookup::Stale {
                        state,
                        generation: entry.generation,
                    }
                } else {
                    Lookup::Fresh(state)
                }
            }
            _ => {
                if entry.value.is_none() {
                    entry.mark_loading();
                }
                Lookup::Missing {
                    generation: entry.generation,
                }
            }
        }
    }

    fn held_value(&self, key: &QueryKey) -> (Option<Arc<V>>, Option<Instant>) {
        rw_read(&self.inner.entries, SOURCE, "held_value")
            .get(key)
            .map(|entry| (entry.value.clone(), entry.fetched_at))
            .unwrap_or((None, None))
    }

    /// `fetch` is only called when a new fetch has to be started.
    fn join_or_start<F, Fut>(
        &self,
        key: &QueryKey,
        generation: Generation,
        fetch: F,
    ) -> SharedFetch<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let (shared, joined) = self.inner.inflight.join_or_start(key, generation, || {
            spawn_fetch(Arc::downgrade(&self.inner), key.clone(), generation, fetch())
        });
        if joined {
            let kind = self.inner.kind.as_str();
            counter!("compass_query_inflight_joined_total", "kind" => kind).increment(1);
            debug!(cache = kind, key = %key, outcome = "joined", "Joined in-flight query");
        }
        shared
    }
}

fn spawn_fetch<V, Fut>(
    cache: Weak<Inner<V>>,
    key: QueryKey,
    generation: Generation,
    fut: Fut,
) -> SharedFetch<V>
where
    V: Send + Sync + 'static,
    Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
{
    let task_cache = cache.clone();
    let task_key = key.clone();
    let task = tokio::spawn(async move {
        let started = Instant::now();
        let result = fut.await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match task_cache.upgrade() {
            Some(inner) => {
                histogram!("compass_query_fetch_ms", "kind" => inner.kind.as_str())
                    .record(elapsed_ms);
                inner.complete(&task_key, generation, result)
            }
            None => result.map(|value| Fetched {
                value: Arc::new(value),
                at: Instant::now(),
            }),
        }
    });

    async move {
        match task.await {
            Ok(result) => result,
            Err(err) => {
                if let Some(inner) = cache.upgrade() {
                    inner.inflight.finish(&key, generation);
                }
                Err(ApiError::transport(format!("query fetch task failed: {err}")))
            }
        }
    }
    .boxed()
    .shared()
}

impl<V> Inner<V> {
    /// Record the outcome of a fetch unless its entry moved to a newer generation.
    fn complete(
        &self,
        key: &QueryKey,
        generation: Generation,
        result: Result<V, ApiError>,
    ) -> FetchResult<V> {
        let now = Instant::now();
        let kind = self.kind.as_str();

        let outcome = {
            let mut entries = rw_write(&self.entries, SOURCE, "complete");
            let entry = entries
                .get_mut(key)
                .filter(|entry| entry.generation == generation);

            match (result, entry) {
                (Ok(value), Some(entry)) => {
                    let value = Arc::new(value);
                    entry.value = Some(Arc::clone(&value));
                    entry.fetched_at = Some(now);
                    entry.invalidated = false;
                    entry
                        .state
                        .send_replace(QueryState::success(Arc::clone(&value), now));
                    Ok(Fetched { value, at: now })
                }
                (Err(err), Some(entry)) => {
                    debug!(cache = kind, key = %key, error = %err, "Query fetch failed");
                    entry.state.send_replace(QueryState::failed(
                        err.clone(),
                        entry.value.clone(),
                        entry.fetched_at,
                    ));
                    Err(err)
                }
                (result, None) => {
                    debug!(
                        cache = kind,
                        key = %key,
                        outcome = "superseded",
                        "Discarded result of superseded fetch"
                    );
                    result.map(|value| Fetched {
                        value: Arc::new(value),
                        at: now,
                    })
                }
            }
        };

        self.inflight.finish(key, generation);
        outcome
    }
}
