use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use culinary_compass::api_types::{
    CustomerReview, Menus, PostReviewRequest, Restaurant, RestaurantDetail, RestaurantList,
    SearchResults,
};
use culinary_compass::application::{
    ApiError, Notification, NotificationKind, RestaurantQueries, RestaurantSource,
};
use culinary_compass::cache::CacheConfig;

/// In-memory source that counts calls and answers after a short delay.
#[derive(Default)]
struct FakeSource {
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    search_calls: AtomicUsize,
    review_calls: AtomicUsize,
    fail_next_detail: AtomicBool,
    fail_reviews: AtomicBool,
}

const LATENCY: Duration = Duration::from_millis(20);

fn restaurant(id: &str, name: &str, city: &str, rating: f64) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: name.to_string(),
        description: "Lorem ipsum".to_string(),
        picture_id: "14".to_string(),
        city: city.to_string(),
        rating,
    }
}

#[async_trait]
impl RestaurantSource for FakeSource {
    async fn list_all(&self) -> Result<RestaurantList, ApiError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(LATENCY).await;
        Ok(RestaurantList {
            count: call as u64,
            restaurants: vec![
                restaurant("a", "Melting Pot", "Medan", 4.2),
                restaurant("b", "Kafe Kita", "Gorontalo", 4.0),
            ],
        })
    }

    async fn detail(&self, id: &str) -> Result<RestaurantDetail, ApiError> {
        let call = self.detail_calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(LATENCY).await;
        if self.fail_next_detail.swap(false, Ordering::SeqCst) {
            return Err(ApiError::network());
        }
        Ok(RestaurantDetail {
            id: id.to_string(),
            name: format!("Restaurant {id} v{call}"),
            description: "Lorem ipsum".to_string(),
            picture_id: "14".to_string(),
            city: "Medan".to_string(),
            address: "Jln. Pandeglang no 19".to_string(),
            rating: 4.2,
            categories: Vec::new(),
            menus: Menus::default(),
            customer_reviews: Vec::new(),
        })
    }

    async fn search(&self, query: &str) -> Result<SearchResults, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(LATENCY).await;
        let restaurants = if query == "kafe" {
            vec![restaurant("b", "Kafe Kita", "Gorontalo", 4.0)]
        } else {
            Vec::new()
        };
        Ok(SearchResults {
            found: restaurants.len() as u64,
            restaurants,
        })
    }

    async fn submit_review(
        &self,
        request: &PostReviewRequest,
    ) -> Result<Vec<CustomerReview>, ApiError> {
        self.review_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(LATENCY).await;
        if self.fail_reviews.load(Ordering::SeqCst) {
            return Err(ApiError::api(Some("Server down".to_string()), 500));
        }
        Ok(vec![CustomerReview {
            name: request.name.clone(),
            review: request.review.clone(),
            date: "18 Oktober 2026".to_string(),
        }])
    }
}

fn setup() -> (Arc<FakeSource>, RestaurantQueries) {
    let source = Arc::new(FakeSource::default());
    let queries = RestaurantQueries::new(source.clone(), &CacheConfig::default());
    (source, queries)
}

type Inbox = Arc<Mutex<Vec<Notification>>>;

fn inbox_sink() -> (Inbox, Arc<dyn culinary_compass::application::NotificationSink>) {
    let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let inbox = Arc::clone(&inbox);
        move |notification: Notification| inbox.lock().expect("inbox").push(notification)
    };
    (inbox, Arc::new(sink))
}

#[tokio::test(start_paused = true)]
async fn concurrent_detail_reads_share_one_call() {
    let (source, queries) = setup();

    let (first, second) = tokio::join!(
        queries.restaurant_detail("a"),
        queries.restaurant_detail("a")
    );

    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.data().map(|d| d.name.as_str()), Some("Restaurant a v1"));
    assert_eq!(second.data().map(|d| d.name.as_str()), Some("Restaurant a v1"));
}

#[tokio::test(start_paused = true)]
async fn distinct_ids_fetch_independently() {
    let (source, queries) = setup();

    let (a, b) = tokio::join!(
        queries.restaurant_detail("a"),
        queries.restaurant_detail("b")
    );

    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.data().map(|d| d.id.as_str()), Some("a"));
    assert_eq!(b.data().map(|d| d.id.as_str()), Some("b"));
}

#[tokio::test(start_paused = true)]
async fn fresh_list_is_served_from_cache() {
    let (source, queries) = setup();

    queries.restaurants().await;
    tokio::time::advance(Duration::from_secs(299)).await;
    let again = queries.restaurants().await;

    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(again.data().map(|l| l.count), Some(1));
}

#[tokio::test(start_paused = true)]
async fn stale_list_is_served_while_refreshing() {
    let (source, queries) = setup();

    queries.restaurants().await;
    tokio::time::advance(Duration::from_secs(301)).await;

    let stale = queries.restaurants().await;
    assert_eq!(stale.data().map(|l| l.count), Some(1));

    tokio::time::sleep(LATENCY * 2).await;
    let refreshed = queries.restaurants().await;
    assert_eq!(refreshed.data().map(|l| l.count), Some(2));
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn search_goes_stale_sooner_than_details() {
    let (source, queries) = setup();

    queries.search("kafe").await;
    queries.restaurant_detail("a").await;
    tokio::time::advance(Duration::from_secs(121)).await;

    queries.search("kafe").await;
    queries.restaurant_detail("a").await;
    tokio::time::sleep(LATENCY * 2).await;

    assert_eq!(source.search_calls.load(Ordering::SeqCst), 2);
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_search_is_idle_and_distinct_from_no_matches() {
    let (source, queries) = setup();

    let idle = queries.search("").await;
    assert!(idle.is_idle());
    assert!(idle.data().is_none());
    assert!(idle.error().is_none());
    assert_eq!(source.search_calls.load(Ordering::SeqCst), 0);

    let empty = queries.search("zzz").await;
    assert!(empty.is_success());
    assert_eq!(empty.data().map(|r| r.found), Some(0));
    assert_eq!(source.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn whitespace_search_is_still_sent() {
    let (source, queries) = setup();

    let state = queries.search("  ").await;

    assert!(state.is_success());
    assert_eq!(source.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_detail_id_is_idle() {
    let (source, queries) = setup();

    let state = queries.restaurant_detail("").await;

    assert!(state.is_idle());
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_reads_are_not_cached() {
    let (source, queries) = setup();
    source.fail_next_detail.store(true, Ordering::SeqCst);

    let failed = queries.restaurant_detail("a").await;
    assert!(failed.is_error());
    assert_eq!(failed.error().map(ApiError::message), Some("Network Error"));
    assert_eq!(failed.error().and_then(ApiError::status), None);

    let retried = queries.restaurant_detail("a").await;
    assert!(retried.is_success());
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn dropped_reader_still_fills_the_cache() {
    let (source, queries) = setup();

    let reader = {
        let queries = queries.clone();
        tokio::spawn(async move { queries.restaurant_detail("a").await })
    };
    tokio::task::yield_now().await;
    reader.abort();

    tokio::time::sleep(LATENCY * 2).await;
    let cached = queries.restaurant_detail("a").await;

    assert!(cached.is_success());
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn review_invalidates_only_that_restaurant_detail() {
    let (source, queries) = setup();
    let (inbox, sink) = inbox_sink();

    queries.restaurants().await;
    queries.search("kafe").await;
    queries.restaurant_detail("a").await;
    queries.restaurant_detail("b").await;

    let reviews = queries
        .review_mutation(sink)
        .submit(PostReviewRequest::new("a", "Dicoding", "Enak"))
        .await
        .expect("review");
    assert_eq!(reviews[0].name, "Dicoding");

    queries.restaurants().await;
    queries.search("kafe").await;
    let refreshed = queries.restaurant_detail("a").await;
    queries.restaurant_detail("b").await;

    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.search_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        refreshed.data().map(|d| d.name.as_str()),
        Some("Restaurant a v3")
    );

    let inbox = inbox.lock().expect("inbox");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Success);
    assert_eq!(inbox[0].title, "Review Submitted!");
    assert_eq!(inbox[0].description, "Thank you for sharing your experience.");
}

#[tokio::test(start_paused = true)]
async fn failed_review_notifies_and_keeps_cache() {
    let (source, queries) = setup();
    let (inbox, sink) = inbox_sink();
    source.fail_reviews.store(true, Ordering::SeqCst);

    queries.restaurant_detail("a").await;
    let err = queries
        .review_mutation(sink)
        .submit(PostReviewRequest::new("a", "Dicoding", "Enak"))
        .await
        .expect_err("review fails");
    assert_eq!(err.message(), "Server down");

    queries.restaurant_detail("a").await;
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 1);

    let inbox = inbox.lock().expect("inbox");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Failure);
    assert_eq!(inbox[0].title, "Failed to Submit Review");
    assert_eq!(inbox[0].description, "Server down");
}

#[tokio::test(start_paused = true)]
async fn mutation_reports_pending_while_submitting() {
    let (source, queries) = setup();
    let (_inbox, sink) = inbox_sink();
    let mutation = queries.review_mutation(sink);

    let submit = {
        let mutation = mutation.clone();
        tokio::spawn(async move {
            mutation
                .submit(PostReviewRequest::new("a", "Dicoding", "Enak"))
                .await
        })
    };
    tokio::task::yield_now().await;
    assert!(mutation.is_pending());

    submit.await.expect("join").expect("review");
    assert!(!mutation.is_pending());
    assert_eq!(source.review_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn observers_follow_loading_success_and_refetch_after_review() {
    let (source, queries) = setup();
    let (_inbox, sink) = inbox_sink();
    let mut rx = queries.watch_detail("a");
    assert!(rx.borrow_and_update().is_idle());

    let reader = {
        let queries = queries.clone();
        tokio::spawn(async move { queries.restaurant_detail("a").await })
    };

    rx.changed().await.expect("loading");
    assert!(rx.borrow_and_update().is_loading());
    rx.changed().await.expect("success");
    assert_eq!(
        rx.borrow_and_update().data().map(|d| d.name.clone()),
        Some("Restaurant a v1".to_string())
    );
    reader.await.expect("reader");

    queries
        .review_mutation(sink)
        .submit(PostReviewRequest::new("a", "Dicoding", "Enak"))
        .await
        .expect("review");

    rx.changed().await.expect("refetched");
    assert_eq!(
        rx.borrow_and_update().data().map(|d| d.name.clone()),
        Some("Restaurant a v2".to_string())
    );
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_ids_are_observed_as_idle() {
    let (_source, queries) = setup();

    assert!(queries.watch_detail("").borrow().is_idle());
    assert!(queries.watch_search("").borrow().is_idle());
}

#[tokio::test(start_paused = true)]
async fn list_observer_sees_initial_fetch() {
    let (_source, queries) = setup();
    let mut rx = queries.watch_restaurants();

    queries.restaurants().await;

    assert!(rx.has_changed().expect("sender alive"));
    assert_eq!(rx.borrow_and_update().data().map(|l| l.count), Some(1));
}
