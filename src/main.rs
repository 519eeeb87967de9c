use std::{process, sync::Arc};

use culinary_compass::{
    application::{AppError, RestaurantQueries},
    cache::CacheConfig,
    config,
    infra::{api::RestaurantApi, telemetry},
};
use tracing::{Dispatch, Level, debug, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

mod commands;
mod print;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let api = RestaurantApi::new(&settings.api)?;
    debug!(base_url = %api.base_url(), "Restaurant API client ready");

    let queries = RestaurantQueries::new(Arc::new(api), &CacheConfig::from(&settings.cache));
    commands::dispatch(cli_args.command, &queries, &settings).await
}
