//! Derived views over restaurant collections.
//!
//! Every function here is pure: inputs are borrowed or consumed and a new
//! collection is returned, so cached values are never mutated.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use slug::slugify;

use crate::api_types::Restaurant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Rating,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Client-side constraints applied to a fetched list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantFilter {
    /// Exact, case-sensitive city match; `None` or empty means no constraint.
    pub city: Option<String>,
    /// Minimum rating; only a value `> 0` constrains, so zero, negatives and NaN do not.
    pub min_rating: f64,
    pub sort_by: Option<SortKey>,
    pub order: SortOrder,
}

impl RestaurantFilter {
    fn city(&self) -> Option<&str> {
        self.city.as_deref().filter(|city| !city.is_empty())
    }

    fn min_rating(&self) -> Option<f64> {
        (self.min_rating > 0.0).then_some(self.min_rating)
    }

    fn accepts(&self, restaurant: &Restaurant) -> bool {
        self.city().is_none_or(|city| restaurant.city == city)
            && self.min_rating().is_none_or(|min| restaurant.rating >= min)
    }
}

/// Keep the restaurants matching every active constraint, in input order.
pub fn filter_restaurants(
    restaurants: &[Restaurant],
    filter: &RestaurantFilter,
) -> Vec<Restaurant> {
    restaurants
        .iter()
        .filter(|restaurant| filter.accepts(restaurant))
        .cloned()
        .collect()
}

/// Stable sort by `key`; `None` leaves the order unchanged.
pub fn sort_restaurants(
    mut restaurants: Vec<Restaurant>,
    key: Option<SortKey>,
    order: SortOrder,
) -> Vec<Restaurant> {
    let Some(key) = key else {
        return restaurants;
    };

    restaurants.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Name => compare_names(&a.name, &b.name),
            SortKey::Rating => a.rating.total_cmp(&b.rating),
        };
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    restaurants
}

/// Filter, then sort, according to `filter`.
pub fn apply(restaurants: &[Restaurant], filter: &RestaurantFilter) -> Vec<Restaurant> {
    sort_restaurants(
        filter_restaurants(restaurants, filter),
        filter.sort_by,
        filter.order,
    )
}

/// Distinct cities in ascending order.
pub fn unique_cities(restaurants: &[Restaurant]) -> Vec<String> {
    restaurants
        .iter()
        .map(|restaurant| restaurant.city.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Locale-aware name order: transliterated, case-folded form first, then
/// lowercase, then raw. Punctuation and whitespace are dropped by the fold, so
/// `'Kafe` orders as `kafe` rather than ahead of every letter.
fn compare_names(a: &str, b: &str) -> Ordering {
    slugify(a)
        .cmp(&slugify(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(id: &str, name: &str, city: &str, rating: f64) -> Restaurant {
        Restaurant {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            picture_id: format!("{id}-pic"),
            city: city.to_string(),
            rating,
        }
    }

    fn sample() -> Vec<Restaurant> {
        vec![
            restaurant("1", "Melting Pot", "Medan", 4.2),
            restaurant("2", "Kafe Kita", "Gorontalo", 4.0),
            restaurant("3", "Bring Your Phone Cafe", "Surabaya", 4.2),
            restaurant("4", "Kafein", "Aceh", 4.6),
            restaurant("5", "Drinkky", "Surabaya", 3.9),
        ]
    }

    fn ids(restaurants: &[Restaurant]) -> Vec<&str> {
        restaurants.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let list = sample();
        let filtered = filter_restaurants(&list, &RestaurantFilter::default());
        assert_eq!(filtered, list);
    }

    #[test]
    fn city_and_rating_constraints_combine() {
        let list = sample();
        let filter = RestaurantFilter {
            city: Some("Surabaya".to_string()),
            min_rating: 4.0,
            ..Default::default()
        };
        assert_eq!(ids(&filter_restaurants(&list, &filter)), ["3"]);
    }

    #[test]
    fn city_match_is_exact() {
        let list = sample();
        let filter = RestaurantFilter {
            city: Some("surabaya".to_string()),
            ..Default::default()
        };
        assert!(filter_restaurants(&list, &filter).is_empty());
    }

    #[test]
    fn empty_city_means_no_constraint() {
        let list = sample();
        let filter = RestaurantFilter {
            city: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter_restaurants(&list, &filter).len(), list.len());
    }

    #[test]
    fn filtered_output_is_ordered_subset() {
        let list = sample();
        let filter = RestaurantFilter {
            min_rating: 4.1,
            ..Default::default()
        };
        let filtered = filter_restaurants(&list, &filter);
        assert_eq!(ids(&filtered), ["1", "3", "4"]);
        assert!(filtered.iter().all(|r| r.rating >= 4.1));
    }

    #[test]
    fn nan_minimum_is_no_constraint() {
        let list = sample();
        let filter = RestaurantFilter {
            min_rating: f64::NAN,
            ..Default::default()
        };
        assert_eq!(filter_restaurants(&list, &filter), list);
    }

    #[test]
    fn rating_sort_descending_is_stable() {
        let sorted = sort_restaurants(sample(), Some(SortKey::Rating), SortOrder::Descending);
        assert_eq!(ids(&sorted), ["4", "1", "3", "2", "5"]);
    }

    #[test]
    fn rating_sort_ascending_is_stable() {
        let sorted = sort_restaurants(sample(), Some(SortKey::Rating), SortOrder::Ascending);
        assert_eq!(ids(&sorted), ["5", "2", "1", "3", "4"]);
    }

    #[test]
    fn name_sort_ignores_case_and_accents() {
        let list = vec![
            restaurant("a", "zeta", "X", 1.0),
            restaurant("b", "Éclair", "X", 1.0),
            restaurant("c", "Alpha", "X", 1.0),
        ];
        let sorted = sort_restaurants(list, Some(SortKey::Name), SortOrder::Ascending);
        assert_eq!(ids(&sorted), ["c", "b", "a"]);
    }

    #[test]
    fn name_sort_skips_leading_punctuation() {
        let list = vec![
            restaurant("a", "Zest", "X", 1.0),
            restaurant("b", "'Kafe", "X", 1.0),
            restaurant("c", "Bistro", "X", 1.0),
        ];
        let sorted = sort_restaurants(list, Some(SortKey::Name), SortOrder::Ascending);
        assert_eq!(ids(&sorted), ["c", "b", "a"]);
    }

    #[test]
    fn name_sort_defaults_to_descending() {
        let filter = RestaurantFilter {
            sort_by: Some(SortKey::Name),
            ..Default::default()
        };
        let sorted = apply(&sample(), &filter);
        assert_eq!(ids(&sorted), ["1", "4", "2", "5", "3"]);
    }

    #[test]
    fn missing_sort_key_preserves_order() {
        let sorted = sort_restaurants(sample(), None, SortOrder::Ascending);
        assert_eq!(ids(&sorted), ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn input_is_left_untouched() {
        let list = sample();
        let snapshot = list.clone();
        let filter = RestaurantFilter {
            min_rating: 4.5,
            sort_by: Some(SortKey::Rating),
            order: SortOrder::Ascending,
            ..Default::default()
        };
        let _ = apply(&list, &filter);
        assert_eq!(list, snapshot);
    }

    #[test]
    fn unique_cities_are_sorted_and_distinct() {
        assert_eq!(
            unique_cities(&sample()),
            ["Aceh", "Gorontalo", "Medan", "Surabaya"]
        );
        assert!(unique_cities(&[]).is_empty());
    }
}
