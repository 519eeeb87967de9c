//! Data access layer: cache-aware queries, review mutation, notifications.

pub mod error;
pub mod notifications;
pub mod queries;
pub mod reviews;
pub mod source;

pub use error::{ApiError, ApiErrorKind, AppError};
pub use notifications::{Notification, NotificationKind, NotificationSink, TracingNotifier};
pub use queries::RestaurantQueries;
pub use reviews::{ReviewMutation, review_failure_description};
pub use source::RestaurantSource;
