//! Port describing the remote restaurant catalogue.

use async_trait::async_trait;

use crate::api_types::{
    CustomerReview, PostReviewRequest, RestaurantDetail, RestaurantList, SearchResults,
};
use crate::application::error::ApiError;

/// Remote operations the query layer depends on.
///
/// Implemented by [`crate::infra::api::RestaurantApi`]; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait RestaurantSource: Send + Sync {
    async fn list_all(&self) -> Result<RestaurantList, ApiError>;

    async fn detail(&self, id: &str) -> Result<RestaurantDetail, ApiError>;

    async fn search(&self, query: &str) -> Result<SearchResults, ApiError>;

    /// Post a review and return the restaurant's updated review list.
    async fn submit_review(
        &self,
        request: &PostReviewRequest,
    ) -> Result<Vec<CustomerReview>, ApiError>;
}
