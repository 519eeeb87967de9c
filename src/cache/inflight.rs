use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

use crate::application::error::ApiError;

use super::keys::QueryKey;

/// Generation stamp of a cache entry; bumped on every invalidation.
pub type Generation = u64;

/// Value produced by a completed fetch.
pub struct Fetched<V> {
    pub value: Arc<V>,
    pub at: Instant,
}

impl<V> Clone for Fetched<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            at: self.at,
        }
    }
}

pub type FetchResult<V> = Result<Fetched<V>, ApiError>;

/// A fetch that any number of readers can await.
pub type SharedFetch<V> = Shared<BoxFuture<'static, FetchResult<V>>>;

struct InFlight<V> {
    generation: Generation,
    fetch: SharedFetch<V>,
}

/// Outstanding fetches, at most one per key.
pub(crate) struct InFlightFetches<V> {
    fetches: DashMap<QueryKey, InFlight<V>>,
}

impl<V> InFlightFetches<V> {
    pub(crate) fn new() -> Self {
        Self {
            fetches: DashMap::new(),
        }
    }

    /// Join the outstanding fetch for `key` or register a new one built by `start`.
    ///
    /// A registered fetch is only joined when it belongs to the same generation
    /// and has not resolved yet. Returns the fetch and whether it was joined.
    pub(crate) fn join_or_start(
        &self,
        key: &QueryKey,
        generation: Generation,
        start: impl FnOnce() -> SharedFetch<V>,
    ) -> (SharedFetch<V>, bool) {
        match self.fetches.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                if current.generation == generation && current.fetch.peek().is_none() {
                    return (current.fetch.clone(), true);
                }
                let fetch = start();
                occupied.insert(InFlight {
                    generation,
                    fetch: fetch.clone(),
                });
                (fetch, false)
            }
            Entry::Vacant(vacant) => {
                let fetch = start();
                vacant.insert(InFlight {
                    generation,
                    fetch: fetch.clone(),
                });
                (fetch, false)
            }
        }
    }

    /// Drop the registration for `key` if it still belongs to `generation`.
    pub(crate) fn finish(&self, key: &QueryKey, generation: Generation) {
        self.fetches
            .remove_if(key, |_, inflight| inflight.generation == generation);
    }

    /// Forget any registration for `key`; a running fetch keeps going but is no
    /// longer joinable.
    pub(crate) fn forget(&self, key: &QueryKey) -> bool {
        self.fetches.remove(key).is_some()
    }

    pub(crate) fn contains(&self, key: &QueryKey) -> bool {
        self.fetches.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.fetches.len()
    }
}
