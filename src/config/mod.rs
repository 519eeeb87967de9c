//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{
    CliArgs, Command, DetailArgs, FilterArgs, GlobalOverrides, ImageSizeArg, ImageUrlArgs,
    ListArgs, ReviewArgs, SearchArgs, SortKeyArg, SortOrderArg,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "compass";
pub(crate) const DEFAULT_API_BASE_URL: &str = "https://restaurant-api.dicoding.dev";
pub(crate) const DEFAULT_IMAGE_BASE_URL: &str = "https://restaurant-api.dicoding.dev/images";
const DEFAULT_LIST_STALE_SECS: u64 = 5 * 60;
const DEFAULT_DETAIL_STALE_SECS: u64 = 5 * 60;
const DEFAULT_SEARCH_STALE_SECS: u64 = 2 * 60;
const DEFAULT_GC_SECS: u64 = 10 * 60;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Always ends with `/` so relative joins append to its path.
    pub base_url: Url,
    pub image_base_url: String,
    /// Transport-level timeout; `None` leaves timing entirely to the transport.
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub list_stale: Duration,
    pub detail_stale: Duration,
    pub search_stale: Duration,
    pub gc: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Parse the process arguments and load settings for them.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("COMPASS").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    cache: RawCacheSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    image_base_url: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    list_stale_seconds: Option<u64>,
    detail_stale_seconds: Option<u64>,
    search_stale_seconds: Option<u64>,
    gc_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            cache,
            logging,
        } = raw;

        let api = build_api_settings(api)?;
        let cache = build_cache_settings(cache)?;
        let logging = build_logging_settings(logging)?;

        Ok(Self {
            api,
            cache,
            logging,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let base = api
        .base_url
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let base_url =
        parse_base_url(&base).map_err(|reason| LoadError::invalid("api.base_url", reason))?;

    let image_base = api
        .image_base_url
        .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string());
    parse_base_url(&image_base)
        .map_err(|reason| LoadError::invalid("api.image_base_url", reason))?;
    let image_base_url = image_base.trim().trim_end_matches('/').to_string();

    let request_timeout = match api.request_timeout_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "api.request_timeout_seconds",
                "must be greater than zero when set",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };

    Ok(ApiSettings {
        base_url,
        image_base_url,
        request_timeout,
    })
}

fn parse_base_url(value: &str) -> Result<Url, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("must not be empty".to_string());
    }
    let mut url = Url::parse(trimmed).map_err(|err| format!("failed to parse: {err}"))?;
    if url.cannot_be_a_base() {
        return Err("must be an absolute http(s) URL".to_string());
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let list_stale =
        Duration::from_secs(cache.list_stale_seconds.unwrap_or(DEFAULT_LIST_STALE_SECS));
    let detail_stale =
        Duration::from_secs(cache.detail_stale_seconds.unwrap_or(DEFAULT_DETAIL_STALE_SECS));
    let search_stale =
        Duration::from_secs(cache.search_stale_seconds.unwrap_or(DEFAULT_SEARCH_STALE_SECS));

    let gc_seconds = cache.gc_seconds.unwrap_or(DEFAULT_GC_SECS);
    if gc_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.gc_seconds",
            "must be greater than zero",
        ));
    }
    let gc = Duration::from_secs(gc_seconds);

    let longest_stale = list_stale.max(detail_stale).max(search_stale);
    if gc < longest_stale {
        return Err(LoadError::invalid(
            "cache.gc_seconds",
            format!(
                "must be at least the longest staleness window ({}s)",
                longest_stale.as_secs()
            ),
        ));
    }

    Ok(CacheSettings {
        list_stale,
        detail_stale,
        search_stale,
        gc,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}
