//! Wire types for the restaurant API.
//!
//! Field names follow the remote JSON exactly (`pictureId`, `customerReviews`,
//! `founded`); the Rust side uses snake_case and serde renames.

use serde::{Deserialize, Serialize};

/// Flag/message pair carried by every response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Restaurant summary as returned by `/list` and `/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub description: String,
    pub picture_id: String,
    pub city: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menus {
    #[serde(default)]
    pub foods: Vec<MenuItem>,
    #[serde(default)]
    pub drinks: Vec<MenuItem>,
}

/// A review; `date` is assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerReview {
    pub name: String,
    pub review: String,
    pub date: String,
}

/// Full restaurant record from `/detail/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub picture_id: String,
    pub city: String,
    pub address: String,
    pub rating: f64,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub menus: Menus,
    #[serde(default)]
    pub customer_reviews: Vec<CustomerReview>,
}

impl RestaurantDetail {
    /// Summary view of this record.
    pub fn summary(&self) -> Restaurant {
        Restaurant {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            picture_id: self.picture_id.clone(),
            city: self.city.clone(),
            rating: self.rating,
        }
    }
}

/// Payload of `GET /list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantList {
    pub count: u64,
    pub restaurants: Vec<Restaurant>,
}

/// Payload of `GET /search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(rename = "founded")]
    pub found: u64,
    pub restaurants: Vec<Restaurant>,
}

/// Payload of `GET /detail/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailPayload {
    pub restaurant: RestaurantDetail,
}

/// Payload of `POST /review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsPayload {
    pub customer_reviews: Vec<CustomerReview>,
}

/// Body of `POST /review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReviewRequest {
    pub id: String,
    pub name: String,
    pub review: String,
}

impl PostReviewRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, review: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            review: review.into(),
        }
    }
}
