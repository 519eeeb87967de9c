use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::info;

use culinary_compass::{
    api_types::{CustomerReview, PostReviewRequest, Restaurant, RestaurantDetail},
    application::{AppError, Notification, RestaurantQueries},
    cache::{QueryState, QueryStatus},
    config::{Command, DetailArgs, ImageUrlArgs, ListArgs, ReviewArgs, SearchArgs, Settings},
    domain::{
        filters::{self, RestaurantFilter},
        image::{ImageSize, image_url},
    },
};

use crate::print::print_json;

#[derive(Serialize)]
struct ListOutput {
    count: usize,
    restaurants: Vec<Restaurant>,
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    status: &'static str,
    /// Matches reported by the server, before local filters.
    found: Option<u64>,
    restaurants: Vec<Restaurant>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailOutput<'a> {
    #[serde(flatten)]
    restaurant: &'a RestaurantDetail,
    image_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewOutput<'a> {
    notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_reviews: Option<&'a [CustomerReview]>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageUrlOutput<'a> {
    picture_id: &'a str,
    size: &'static str,
    url: String,
}

pub async fn dispatch(
    command: Command,
    queries: &RestaurantQueries,
    settings: &Settings,
) -> Result<(), AppError> {
    match command {
        Command::List(args) => list(queries, &args).await,
        Command::Search(args) => search(queries, &args).await,
        Command::Detail(args) => detail(queries, settings, &args).await,
        Command::Review(args) => review(queries, args).await,
        Command::Cities => cities(queries).await,
        Command::ImageUrl(args) => image(settings, &args),
    }
}

async fn list(queries: &RestaurantQueries, args: &ListArgs) -> Result<(), AppError> {
    let list = require_data(queries.restaurants().await)?;
    let filter = RestaurantFilter::from(&args.filters);
    let restaurants = filters::apply(&list.restaurants, &filter);

    print_json(&ListOutput {
        count: restaurants.len(),
        restaurants,
    })
}

async fn search(queries: &RestaurantQueries, args: &SearchArgs) -> Result<(), AppError> {
    let state = queries.search(&args.query).await;
    if state.is_idle() {
        return print_json(&SearchOutput {
            query: &args.query,
            status: QueryStatus::Idle.as_str(),
            found: None,
            restaurants: Vec::new(),
        });
    }

    let results = require_data(state)?;
    let filter = RestaurantFilter::from(&args.filters);
    print_json(&SearchOutput {
        query: &args.query,
        status: QueryStatus::Success.as_str(),
        found: Some(results.found),
        restaurants: filters::apply(&results.restaurants, &filter),
    })
}

async fn detail(
    queries: &RestaurantQueries,
    settings: &Settings,
    args: &DetailArgs,
) -> Result<(), AppError> {
    let state = queries.restaurant_detail(&args.id).await;
    if state.is_idle() {
        return print_json(&serde_json::json!({
            "id": args.id,
            "status": QueryStatus::Idle.as_str(),
        }));
    }

    let restaurant = require_data(state)?;
    print_json(&DetailOutput {
        restaurant: &restaurant,
        image_url: image_url(
            &settings.api.image_base_url,
            &restaurant.picture_id,
            ImageSize::default(),
        ),
    })
}

async fn review(queries: &RestaurantQueries, args: ReviewArgs) -> Result<(), AppError> {
    let received: Arc<Mutex<Option<Notification>>> = Arc::new(Mutex::new(None));
    let sink = {
        let received = Arc::clone(&received);
        move |notification: Notification| {
            info!(title = %notification.title, "Review notification");
            *received.lock().unwrap_or_else(PoisonError::into_inner) = Some(notification);
        }
    };

    let mutation = queries.review_mutation(Arc::new(sink));
    let result = mutation
        .submit(PostReviewRequest::new(args.id, args.name, args.text))
        .await;
    let notification = received
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    match result {
        Ok(reviews) => print_json(&ReviewOutput {
            notification,
            customer_reviews: Some(reviews.as_slice()),
        }),
        Err(err) => {
            print_json(&ReviewOutput {
                notification,
                customer_reviews: None,
            })?;
            Err(err.into())
        }
    }
}

async fn cities(queries: &RestaurantQueries) -> Result<(), AppError> {
    let list = require_data(queries.restaurants().await)?;
    print_json(&filters::unique_cities(&list.restaurants))
}

fn image(settings: &Settings, args: &ImageUrlArgs) -> Result<(), AppError> {
    let size = ImageSize::from(args.size);
    print_json(&ImageUrlOutput {
        picture_id: &args.picture_id,
        size: size.as_str(),
        url: image_url(&settings.api.image_base_url, &args.picture_id, size),
    })
}

fn require_data<V>(state: QueryState<V>) -> Result<Arc<V>, AppError> {
    match state.into_result() {
        Some(Ok(data)) => Ok(data),
        Some(Err(err)) => Err(err.into()),
        None => Err(AppError::Output("query finished without data".to_string())),
    }
}
