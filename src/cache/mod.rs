//! In-memory query cache.
//!
//! One [`QueryCache`] per query kind (list, detail, search), each keyed by
//! [`QueryKey`]:
//!
//! - entries are served fresh until their staleness window passes, then served
//!   stale while a background refresh replaces them;
//! - at most one fetch per key is outstanding; concurrent readers join it;
//! - [`QueryCache::invalidate`] forces the next read to re-fetch;
//! - observers receive [`QueryState`] transitions through `watch` channels;
//! - entries idle for the garbage-collection window are dropped lazily.
//!
//! Timing comes from the `[cache]` configuration section:
//!
//! ```toml
//! [cache]
//! list_stale_seconds = 300
//! detail_stale_seconds = 300
//! search_stale_seconds = 120
//! gc_seconds = 600
//! ```

mod config;
mod inflight;
mod keys;
mod lock;
mod state;
mod store;

pub use config::CacheConfig;
pub use keys::{QueryKey, QueryKind};
pub use state::{QueryState, QueryStatus};
pub use store::QueryCache;
