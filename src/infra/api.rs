//! HTTP client for the Dicoding restaurant API.
//!
//! Every response goes through the same normalization: the body is parsed as
//! JSON first, an `error: true` flag wins over the HTTP status, a failing
//! status wins over the payload, and anything that cannot be read or decoded
//! is reported as a transport failure without a status.

use async_trait::async_trait;
use metrics::histogram;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::api_types::{
    ApiEnvelope, CustomerReview, DetailPayload, PostReviewRequest, RestaurantDetail,
    RestaurantList, ReviewsPayload, SearchResults,
};
use crate::application::error::ApiError;
use crate::application::source::RestaurantSource;
use crate::config::ApiSettings;

use super::error::InfraError;

/// Client for the four remote operations. Cheap to share behind an `Arc`.
#[derive(Clone, Debug)]
pub struct RestaurantApi {
    client: Client,
    base: Url,
}

impl RestaurantApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, InfraError> {
        if settings.base_url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "api base URL `{}` cannot carry a path",
                settings.base_url
            )));
        }

        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            base: settings.base_url.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("culinary-compass/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::invalid_input("api base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let exchanged = exchange(operation, request).await;
        histogram!("compass_api_request_ms", "kind" => operation)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        let (status, body) = exchanged?;
        decode(operation, status, body)
    }
}

async fn exchange(
    operation: &'static str,
    request: RequestBuilder,
) -> Result<(StatusCode, Value), ApiError> {
    let response = request
        .send()
        .await
        .map_err(|err| transport_failure(operation, &err))?;
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| transport_failure(operation, &err))?;

    let body = serde_json::from_slice(&bytes).map_err(|err| {
        warn!(
            operation,
            status = status.as_u16(),
            error = %err,
            "Restaurant API returned a body that is not JSON"
        );
        ApiError::network()
    })?;
    Ok((status, body))
}

fn transport_failure(operation: &'static str, err: &reqwest::Error) -> ApiError {
    warn!(
        operation,
        timeout = err.is_timeout(),
        connect = err.is_connect(),
        error = %err,
        "Restaurant API request failed"
    );
    ApiError::network()
}

fn decode<T: DeserializeOwned>(
    operation: &'static str,
    status: StatusCode,
    body: Value,
) -> Result<T, ApiError> {
    let envelope = ApiEnvelope::deserialize(&body).unwrap_or_default();
    if envelope.error {
        debug!(operation, status = status.as_u16(), "Restaurant API reported an error");
        return Err(ApiError::api(envelope.message, status.as_u16()));
    }

    if !status.is_success() {
        return Err(ApiError::http(status.as_u16(), status.canonical_reason()));
    }

    serde_json::from_value(body).map_err(|err| {
        warn!(
            operation,
            error = %err,
            "Restaurant API payload did not match the expected shape"
        );
        ApiError::network()
    })
}

fn require(field: &'static str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid_input(format!(
            "review {field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl RestaurantSource for RestaurantApi {
    async fn list_all(&self) -> Result<RestaurantList, ApiError> {
        let url = self.url(&["list"])?;
        debug!(operation = "list", url = %url, "Requesting restaurant list");
        self.execute("list", self.client.get(url)).await
    }

    async fn detail(&self, id: &str) -> Result<RestaurantDetail, ApiError> {
        if id.trim().is_empty() {
            return Err(ApiError::invalid_input("restaurant id must not be empty"));
        }
        let url = self.url(&["detail", id])?;
        debug!(operation = "detail", url = %url, "Requesting restaurant detail");
        let payload: DetailPayload = self.execute("detail", self.client.get(url)).await?;
        Ok(payload.restaurant)
    }

    async fn search(&self, query: &str) -> Result<SearchResults, ApiError> {
        let mut url = self.url(&["search"])?;
        url.query_pairs_mut().append_pair("q", query);
        debug!(operation = "search", url = %url, "Searching restaurants");
        self.execute("search", self.client.get(url)).await
    }

    async fn submit_review(
        &self,
        request: &PostReviewRequest,
    ) -> Result<Vec<CustomerReview>, ApiError> {
        let body = PostReviewRequest {
            id: require("id", &request.id)?,
            name: require("name", &request.name)?,
            review: require("text", &request.review)?,
        };
        let url = self.url(&["review"])?;
        debug!(operation = "review", url = %url, restaurant_id = %body.id, "Posting review");
        let payload: ReviewsPayload = self
            .execute("review", self.client.post(url).json(&body))
            .await?;
        Ok(payload.customer_reviews)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn api(base: &str) -> RestaurantApi {
        RestaurantApi::new(&ApiSettings {
            base_url: Url::parse(base).expect("url"),
            image_base_url: "http://images.test".to_string(),
            request_timeout: Some(Duration::from_secs(1)),
        })
        .expect("client")
    }

    #[test]
    fn path_segments_are_encoded() {
        let api = api("https://restaurant-api.dicoding.dev/");
        let url = api.url(&["detail", "a b/c"]).expect("url");
        assert_eq!(
            url.as_str(),
            "https://restaurant-api.dicoding.dev/detail/a%20b%2Fc"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let api = api("http://127.0.0.1:8080/v1/");
        let url = api.url(&["list"]).expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/v1/list");
    }

    #[test]
    fn api_flag_wins_over_status() {
        let body = serde_json::json!({ "error": true, "message": "restaurant not found" });
        let err = decode::<DetailPayload>("detail", StatusCode::NOT_FOUND, body)
            .expect_err("flagged body");
        assert_eq!(err.kind(), crate::application::ApiErrorKind::Api);
        assert_eq!(err.message(), "restaurant not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn failing_status_without_flag_is_http_error() {
        let body = serde_json::json!({ "unexpected": "shape" });
        let err = decode::<RestaurantList>("list", StatusCode::INTERNAL_SERVER_ERROR, body)
            .expect_err("500");
        assert_eq!(err.message(), "HTTP Error: 500 - Internal Server Error");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn shape_mismatch_is_transport_failure() {
        let body = serde_json::json!([1, 2, 3]);
        let err = decode::<RestaurantList>("list", StatusCode::OK, body).expect_err("mismatch");
        assert!(err.is_transport());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn review_fields_are_trimmed_and_required() {
        assert_eq!(require("name", "  Dicoding ").expect("valid"), "Dicoding");
        let err = require("text", "   ").expect_err("blank");
        assert_eq!(err.kind(), crate::application::ApiErrorKind::InvalidInput);
    }
}
