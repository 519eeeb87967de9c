//! Culinary Compass: a typed client and cache-aware query layer for the
//! Dicoding restaurant API.
//!
//! - [`infra::api::RestaurantApi`] talks to the remote service and normalizes
//!   every failure into [`application::ApiError`].
//! - [`application::RestaurantQueries`] fronts it with per-kind caches that
//!   de-duplicate concurrent reads, refresh stale entries in the background and
//!   invalidate detail entries after a review is submitted.
//! - [`domain::filters`] derives filtered, sorted views from fetched lists.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub use culinary_compass_api_types as api_types;
