//! Query cache timing.
//!
//! Staleness windows per query kind plus the garbage-collection window, fed
//! from the `[cache]` section of the configuration.

use std::time::Duration;

use super::keys::QueryKind;

const DEFAULT_LIST_STALE: Duration = Duration::from_secs(5 * 60);
const DEFAULT_DETAIL_STALE: Duration = Duration::from_secs(5 * 60);
const DEFAULT_SEARCH_STALE: Duration = Duration::from_secs(2 * 60);
const DEFAULT_GC: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which a list entry is served stale and refreshed.
    pub list_stale: Duration,
    /// Age after which a detail entry is served stale and refreshed.
    pub detail_stale: Duration,
    /// Age after which a search entry is served stale and refreshed.
    pub search_stale: Duration,
    /// Idle time after which an unobserved entry may be dropped.
    pub gc: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_stale: DEFAULT_LIST_STALE,
            detail_stale: DEFAULT_DETAIL_STALE,
            search_stale: DEFAULT_SEARCH_STALE,
            gc: DEFAULT_GC,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            list_stale: settings.list_stale,
            detail_stale: settings.detail_stale,
            search_stale: settings.search_stale,
            gc: settings.gc,
        }
    }
}

impl CacheConfig {
    pub fn stale_after(&self, kind: QueryKind) -> Duration {
        match kind {
            QueryKind::List => self.list_stale,
            QueryKind::Detail => self.detail_stale,
            QueryKind::Search => self.search_stale,
        }
    }
}
