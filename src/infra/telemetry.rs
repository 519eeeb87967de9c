use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    // stdout carries command output, so logs go to stderr.
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "compass_query_cache_hit_total",
            Unit::Count,
            "Reads served from a fresh cache entry."
        );
        describe_counter!(
            "compass_query_cache_miss_total",
            Unit::Count,
            "Reads that had to wait for a fetch (missing or invalidated entry)."
        );
        describe_counter!(
            "compass_query_cache_stale_total",
            Unit::Count,
            "Reads served from a stale entry while a background refresh runs."
        );
        describe_counter!(
            "compass_query_inflight_joined_total",
            Unit::Count,
            "Reads that joined an already outstanding fetch for the same key."
        );
        describe_counter!(
            "compass_query_cache_evict_total",
            Unit::Count,
            "Entries dropped after the garbage-collection window."
        );
        describe_counter!(
            "compass_query_cache_invalidate_total",
            Unit::Count,
            "Entries marked for re-fetch."
        );
        describe_histogram!(
            "compass_query_fetch_ms",
            Unit::Milliseconds,
            "Latency of fetches issued by the query cache."
        );
        describe_histogram!(
            "compass_api_request_ms",
            Unit::Milliseconds,
            "Latency of restaurant API requests."
        );
    });
}
