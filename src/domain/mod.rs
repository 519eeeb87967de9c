//! Pure domain helpers: derived restaurant views and image URLs.

pub mod filters;
pub mod image;
