//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU32, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::posts::{DEFAULT_LOAD_MORE_SIZE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const ENV_PREFIX: &str = "FOLIO";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 4;

/// Command-line arguments for the folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Folio blog post store")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply the document table migration.
    Migrate(MigrateArgs),
    /// Create a post from a source file.
    Create(CreateArgs),
    /// Replace the content of an existing post.
    Edit(EditArgs),
    /// Make a post public, publishing it the first time.
    Publish(SlugArgs),
    /// Hide a post; a published post keeps its publication date.
    Hide(SlugArgs),
    /// Delete every view of a post.
    Delete(SlugArgs),
    /// List posts, most recently updated first.
    List(ListArgs),
    /// Print the total read count across all posts.
    Stats(StatsArgs),
}

impl Command {
    pub fn overrides(&self) -> &CommonOverrides {
        match self {
            Command::Migrate(args) => &args.overrides,
            Command::Create(args) => &args.overrides,
            Command::Edit(args) => &args.overrides,
            Command::Publish(args) | Command::Hide(args) | Command::Delete(args) => {
                &args.overrides
            }
            Command::List(args) => &args.overrides,
            Command::Stats(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct CommonOverrides {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct PostContentArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub author: String,

    /// Absolute URL of the featured image.
    #[arg(long = "featured-image", value_name = "URL")]
    pub featured_image: Option<String>,

    /// Request public visibility.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub public: bool,

    /// File holding the post source.
    #[arg(long = "source-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub source_file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    #[command(flatten)]
    pub content: PostContentArgs,

    /// Explicit slug; derived from the title when omitted.
    #[arg(long, value_name = "SLUG")]
    pub slug: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct EditArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    #[arg(value_name = "SLUG")]
    pub slug: String,

    #[command(flatten)]
    pub content: PostContentArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SlugArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    #[arg(value_name = "SLUG")]
    pub slug: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    /// Cursor token printed by a previous `list`.
    #[arg(long, value_name = "TOKEN")]
    pub cursor: Option<String>,

    /// Override the batch size for this call.
    #[arg(long = "page-size", value_name = "COUNT")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub listing: ListingSettings,
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

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub page_size: u32,
    pub load_more_size: u32,
}

impl ListingSettings {
    /// Rows per batch: `page_size` for the first page, `load_more_size` once a
    /// cursor continues the listing.
    pub fn batch_size(&self, continuing: bool) -> u32 {
        if continuing {
            self.load_more_size
        } else {
            self.page_size
        }
    }
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

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command(&cli.command);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    listing: RawListingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    page_size: Option<u32>,
    load_more_size: Option<u32>,
}

impl RawSettings {
    fn apply_command(&mut self, command: &Command) {
        self.apply_overrides(command.overrides());

        if let Command::List(ListArgs {
            page_size: Some(size),
            cursor,
            ..
        }) = command
        {
            match cursor {
                Some(_) => self.listing.load_more_size = Some(*size),
                None => self.listing.page_size = Some(*size),
            }
        }
    }

    fn apply_overrides(&mut self, overrides: &CommonOverrides) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
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
            logging,
            database,
            listing,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            listing: build_listing_settings(listing)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = NonZeroU32::new(max_value).ok_or_else(|| {
        LoadError::invalid("database.max_connections", "must be greater than zero")
    })?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let page_size = check_page_size(
        "listing.page_size",
        listing.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;
    let load_more_size = check_page_size(
        "listing.load_more_size",
        listing.load_more_size.unwrap_or(DEFAULT_LOAD_MORE_SIZE),
    )?;

    Ok(ListingSettings {
        page_size,
        load_more_size,
    })
}

fn check_page_size(key: &'static str, value: u32) -> Result<u32, LoadError> {
    if value == 0 || value > MAX_PAGE_SIZE {
        return Err(LoadError::invalid(
            key,
            format!("must be between 1 and {MAX_PAGE_SIZE}"),
        ));
    }
    Ok(value)
}
