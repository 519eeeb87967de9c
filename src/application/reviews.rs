//! Review submission with cache invalidation and notifications.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tracing::{info, warn};

use crate::api_types::{CustomerReview, PostReviewRequest};
use crate::application::error::ApiError;
use crate::application::notifications::{Notification, NotificationSink};
use crate::application::queries::RestaurantQueries;

pub const REVIEW_SUCCESS_TITLE: &str = "Review Submitted!";
pub const REVIEW_SUCCESS_DESCRIPTION: &str = "Thank you for sharing your experience.";
pub const REVIEW_FAILURE_TITLE: &str = "Failed to Submit Review";
pub const REVIEW_FAILURE_FALLBACK: &str = "Please try again later.";

/// Text shown to the user when a submission fails.
pub fn review_failure_description(error: &ApiError) -> &str {
    let message = error.message().trim();
    if message.is_empty() {
        REVIEW_FAILURE_FALLBACK
    } else {
        message
    }
}

/// Write path for reviews.
///
/// On success only the reviewed restaurant's detail entry is invalidated; list
/// and search entries are left alone. Failures leave every cache untouched.
#[derive(Clone)]
pub struct ReviewMutation {
    queries: RestaurantQueries,
    sink: Arc<dyn NotificationSink>,
    pending: Arc<AtomicUsize>,
}

impl ReviewMutation {
    pub(crate) fn new(queries: RestaurantQueries, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            queries,
            sink,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn submit(
        &self,
        request: PostReviewRequest,
    ) -> Result<Vec<CustomerReview>, ApiError> {
        let _pending = PendingGuard::enter(&self.pending);
        let result = self.queries.source().submit_review(&request).await;

        match &result {
            Ok(reviews) => {
                info!(
                    restaurant_id = %request.id,
                    reviews = reviews.len(),
                    "Review submitted"
                );
                self.queries.invalidate_detail(&request.id);
                self.sink.notify(Notification::success(
                    REVIEW_SUCCESS_TITLE,
                    REVIEW_SUCCESS_DESCRIPTION,
                ));
            }
            Err(err) => {
                warn!(
                    restaurant_id = %request.id,
                    kind = %err.kind(),
                    status = ?err.status(),
                    error = %err,
                    "Review submission failed"
                );
                self.sink.notify(Notification::failure(
                    REVIEW_FAILURE_TITLE,
                    review_failure_description(err),
                ));
            }
        }

        result
    }

    /// True while at least one submission is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }
}

struct PendingGuard {
    pending: Arc<AtomicUsize>,
}

impl PendingGuard {
    fn enter(pending: &Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self {
            pending: Arc::clone(pending),
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}
