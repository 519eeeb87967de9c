//! Observable state of one cached query.

use std::sync::Arc;

use tokio::time::Instant;

use crate::application::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// The query is disabled (for example an empty search) and nothing was requested.
    Idle,
    /// A fetch is outstanding and no data is held yet.
    Loading,
    Success,
    Error,
}

impl QueryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Loading => "loading",
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        }
    }
}

/// Snapshot of a query as seen by a reader or observer.
///
/// `data` may be present alongside `Error` when a refresh of a previously
/// successful entry failed; the last good value is kept.
#[derive(Debug)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    pub data: Option<Arc<V>>,
    pub error: Option<ApiError>,
    pub fetched_at: Option<Instant>,
}

impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

impl<V> QueryState<V> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            status: QueryStatus::Loading,
            ..Self::idle()
        }
    }

    pub fn success(data: Arc<V>, fetched_at: Instant) -> Self {
        Self {
            status: QueryStatus::Success,
            data: Some(data),
            error: None,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn failed(error: ApiError, data: Option<Arc<V>>, fetched_at: Option<Instant>) -> Self {
        Self {
            status: QueryStatus::Error,
            data,
            error: Some(error),
            fetched_at,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn data(&self) -> Option<&V> {
        self.data.as_deref()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    /// Convert into a plain result, dropping any data held next to an error.
    pub fn into_result(self) -> Option<Result<Arc<V>, ApiError>> {
        match (self.error, self.data) {
            (Some(err), _) => Some(Err(err)),
            (None, Some(data)) => Some(Ok(data)),
            (None, None) => None,
        }
    }
}
