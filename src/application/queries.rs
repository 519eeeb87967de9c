//! Cache-aware reads of the restaurant catalogue.

use std::sync::Arc;

use tokio::{runtime::Handle, sync::watch};
use tracing::debug;

use crate::api_types::{RestaurantDetail, RestaurantList, SearchResults};
use crate::application::notifications::NotificationSink;
use crate::application::reviews::ReviewMutation;
use crate::application::source::RestaurantSource;
use crate::cache::{CacheConfig, QueryCache, QueryKey, QueryKind, QueryState};

/// Entry point of the data access layer.
///
/// Holds one cache per query kind in front of a shared [`RestaurantSource`].
/// Cloning is cheap and clones share caches.
#[derive(Clone)]
pub struct RestaurantQueries {
    source: Arc<dyn RestaurantSource>,
    list: QueryCache<RestaurantList>,
    details: QueryCache<RestaurantDetail>,
    searches: QueryCache<SearchResults>,
}

impl RestaurantQueries {
    pub fn new(source: Arc<dyn RestaurantSource>, config: &CacheConfig) -> Self {
        Self {
            source,
            list: QueryCache::new(QueryKind::List, config),
            details: QueryCache::new(QueryKind::Detail, config),
            searches: QueryCache::new(QueryKind::Search, config),
        }
    }

    pub(crate) fn source(&self) -> &Arc<dyn RestaurantSource> {
        &self.source
    }

    /// The full restaurant list.
    pub async fn restaurants(&self) -> QueryState<RestaurantList> {
        let source = Arc::clone(&self.source);
        self.list
            .get_or_fetch(QueryKey::List, move || async move { source.list_all().await })
            .await
    }

    /// One restaurant with menus and reviews; an empty id stays idle.
    pub async fn restaurant_detail(&self, id: &str) -> QueryState<RestaurantDetail> {
        if id.is_empty() {
            debug!(cache = "detail", "Skipping detail query for empty id");
            return QueryState::idle();
        }
        let source = Arc::clone(&self.source);
        let id = id.to_string();
        self.details
            .get_or_fetch(QueryKey::detail(id.as_str()), move || async move {
                source.detail(&id).await
            })
            .await
    }

    /// Search results for `query`; an empty query stays idle.
    ///
    /// An idle state is distinct from a completed search that found nothing.
    pub async fn search(&self, query: &str) -> QueryState<SearchResults> {
        if query.is_empty() {
            debug!(cache = "search", "Skipping search for empty query");
            return QueryState::idle();
        }
        let source = Arc::clone(&self.source);
        let query = query.to_string();
        self.searches
            .get_or_fetch(QueryKey::search(query.as_str()), move || async move {
                source.search(&query).await
            })
            .await
    }

    pub fn watch_restaurants(&self) -> watch::Receiver<QueryState<RestaurantList>> {
        self.list.subscribe(QueryKey::List)
    }

    pub fn watch_detail(&self, id: &str) -> watch::Receiver<QueryState<RestaurantDetail>> {
        if id.is_empty() {
            return idle_receiver();
        }
        self.details.subscribe(QueryKey::detail(id))
    }

    pub fn watch_search(&self, query: &str) -> watch::Receiver<QueryState<SearchResults>> {
        if query.is_empty() {
            return idle_receiver();
        }
        self.searches.subscribe(QueryKey::search(query))
    }

    /// Force the next read of `id` to re-fetch. Observed entries are re-fetched
    /// right away when a runtime is available.
    pub fn invalidate_detail(&self, id: &str) -> bool {
        let key = QueryKey::detail(id);
        if !self.details.invalidate(&key) {
            return false;
        }

        if self.details.is_observed(&key) && Handle::try_current().is_ok() {
            let source = Arc::clone(&self.source);
            let id = id.to_string();
            self.details
                .prefetch(key, move || async move { source.detail(&id).await });
        }
        true
    }

    /// Review submission bound to this query layer's caches.
    pub fn review_mutation(&self, sink: Arc<dyn NotificationSink>) -> ReviewMutation {
        ReviewMutation::new(self.clone(), sink)
    }
}

fn idle_receiver<V>() -> watch::Receiver<QueryState<V>> {
    let (_sender, receiver) = watch::channel(QueryState::idle());
    receiver
}
