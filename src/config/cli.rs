use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, builder::BoolishValueParser};

use crate::domain::filters::{RestaurantFilter, SortKey, SortOrder};
use crate::domain::image::ImageSize;

/// Command-line arguments for the `compass` binary.
#[derive(Debug, Parser)]
#[command(
    name = "compass",
    version,
    about = "Browse, search, and review restaurants from the Dicoding restaurant API"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "COMPASS_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the restaurant API base URL.
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub api_base_url: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List all restaurants, optionally filtered and sorted.
    List(ListArgs),
    /// Search restaurants by name, category, or menu.
    Search(SearchArgs),
    /// Show one restaurant with its menus and reviews.
    Detail(DetailArgs),
    /// Submit a customer review.
    Review(ReviewArgs),
    /// List the distinct cities of all restaurants.
    Cities,
    /// Print the image URL for a picture id.
    #[command(name = "image-url")]
    ImageUrl(ImageUrlArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct FilterArgs {
    /// Keep only restaurants in this city (exact match).
    #[arg(long, value_name = "CITY")]
    pub city: Option<String>,

    /// Keep only restaurants rated at least this value.
    #[arg(long = "min-rating", value_name = "RATING", default_value_t = 0.0)]
    pub min_rating: f64,

    /// Sort key.
    #[arg(long, value_enum)]
    pub sort: Option<SortKeyArg>,

    /// Sort direction.
    #[arg(long, value_enum, default_value_t = SortOrderArg::Desc)]
    pub order: SortOrderArg,
}

impl From<&FilterArgs> for RestaurantFilter {
    fn from(args: &FilterArgs) -> Self {
        Self {
            city: args.city.clone(),
            min_rating: args.min_rating,
            sort_by: args.sort.map(SortKey::from),
            order: args.order.into(),
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    /// Free-text query.
    #[arg(value_name = "QUERY")]
    pub query: String,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DetailArgs {
    /// Restaurant identifier.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewArgs {
    /// Restaurant identifier.
    #[arg(value_name = "ID")]
    pub id: String,

    /// Reviewer name.
    #[arg(long, value_name = "NAME")]
    pub name: String,

    /// Review text.
    #[arg(long, value_name = "TEXT")]
    pub text: String,
}

#[derive(Debug, Args, Clone)]
pub struct ImageUrlArgs {
    /// Picture identifier as returned by the API.
    #[arg(value_name = "PICTURE_ID")]
    pub picture_id: String,

    /// Image size.
    #[arg(long, value_enum, default_value_t = ImageSizeArg::Medium)]
    pub size: ImageSizeArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKeyArg {
    Name,
    Rating,
}

impl From<SortKeyArg> for SortKey {
    fn from(value: SortKeyArg) -> Self {
        match value {
            SortKeyArg::Name => SortKey::Name,
            SortKeyArg::Rating => SortKey::Rating,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrderArg {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrderArg> for SortOrder {
    fn from(value: SortOrderArg) -> Self {
        match value {
            SortOrderArg::Asc => SortOrder::Ascending,
            SortOrderArg::Desc => SortOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ImageSizeArg {
    Small,
    #[default]
    Medium,
    Large,
}

impl From<ImageSizeArg> for ImageSize {
    fn from(value: ImageSizeArg) -> Self {
        match value {
            ImageSizeArg::Small => ImageSize::Small,
            ImageSizeArg::Medium => ImageSize::Medium,
            ImageSizeArg::Large => ImageSize::Large,
        }
    }
}
