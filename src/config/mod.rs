//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    num::NonZeroUsize,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "magblocks";
const ENV_PREFIX: &str = "MAGBLOCKS";
const DEFAULT_FRAGMENT_LIMIT: usize = 256;
const DEFAULT_SINGLE_FLIGHT_WAIT_MS: u64 = 5000;
const DEFAULT_TIMEZONE: &str = "UTC";

/// Command-line arguments for the magblocks binary.
#[derive(Debug, Parser)]
#[command(name = "magblocks", version, about = "Magazine block renderer")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MAGBLOCKS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render one block and print the HTML fragment.
    Render(Box<RenderArgs>),
    /// Print the option schema of every block type as JSON.
    Schema(SchemaArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: RuntimeOverrides,

    /// Block type tag, e.g. `themezee-blocks/magazine-column`.
    #[arg(long = "block", value_name = "TAG")]
    pub block: String,

    /// Block attributes as a JSON object.
    #[arg(long = "options", value_name = "JSON", conflicts_with = "options_file")]
    pub options: Option<String>,

    /// Read block attributes from a JSON file.
    #[arg(long = "options-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub options_file: Option<PathBuf>,

    /// Render this many times; later renders are served from the cache.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SchemaArgs {
    /// Only print the schema for this block type tag.
    #[arg(long = "block", value_name = "TAG")]
    pub block: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RuntimeOverrides {
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

    /// Enable or disable the fragment cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the maximum number of cached fragments.
    #[arg(long = "cache-fragment-limit", value_name = "COUNT")]
    pub cache_fragment_limit: Option<u64>,

    /// Override where the fragment cache snapshot is stored.
    #[arg(long = "cache-snapshot-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub cache_snapshot_path: Option<PathBuf>,

    /// Override the display time zone (IANA name).
    #[arg(long = "render-timezone", value_name = "ZONE")]
    pub render_timezone: Option<String>,

    /// Override the content fixture file.
    #[arg(long = "content-fixture", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_fixture: Option<PathBuf>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub render: RenderSettings,
    pub content: ContentSettings,
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
pub struct CacheSettings {
    pub enabled: bool,
    pub fragment_limit: NonZeroUsize,
    pub single_flight_wait: Duration,
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub timezone: Tz,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub fixture: Option<PathBuf>,
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

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    if let Some(Command::Render(args)) = cli.command.as_ref() {
        raw.apply_runtime_overrides(&args.overrides);
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    render: RawRenderSettings,
    content: RawContentSettings,
}

impl RawSettings {
    fn apply_runtime_overrides(&mut self, overrides: &RuntimeOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(limit) = overrides.cache_fragment_limit {
            self.cache.fragment_limit = Some(limit);
        }
        if let Some(path) = overrides.cache_snapshot_path.as_ref() {
            self.cache.snapshot_path = Some(path.clone());
        }
        if let Some(zone) = overrides.render_timezone.as_ref() {
            self.render.timezone = Some(zone.clone());
        }
        if let Some(path) = overrides.content_fixture.as_ref() {
            self.content.fixture = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            render,
            content,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            cache: build_cache_settings(cache)?,
            render: build_render_settings(render)?,
            content: build_content_settings(content),
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

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let limit = cache
        .fragment_limit
        .unwrap_or(DEFAULT_FRAGMENT_LIMIT as u64);
    let limit = usize::try_from(limit)
        .map_err(|_| LoadError::invalid("cache.fragment_limit", "value exceeds supported range"))?;
    let fragment_limit = NonZeroUsize::new(limit)
        .ok_or_else(|| LoadError::invalid("cache.fragment_limit", "must be greater than zero"))?;

    let wait_ms = cache
        .single_flight_wait_ms
        .unwrap_or(DEFAULT_SINGLE_FLIGHT_WAIT_MS);
    if wait_ms == 0 {
        return Err(LoadError::invalid(
            "cache.single_flight_wait_ms",
            "must be greater than zero",
        ));
    }

    let snapshot_path = cache
        .snapshot_path
        .filter(|path| !path.as_os_str().is_empty());

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        fragment_limit,
        single_flight_wait: Duration::from_millis(wait_ms),
        snapshot_path,
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let name = render
        .timezone
        .map(|zone| zone.trim().to_string())
        .filter(|zone| !zone.is_empty())
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let timezone = Tz::from_str(&name).map_err(|err| {
        LoadError::invalid("render.timezone", format!("unknown time zone `{name}`: {err}"))
    })?;

    Ok(RenderSettings { timezone })
}

fn build_content_settings(content: RawContentSettings) -> ContentSettings {
    ContentSettings {
        fixture: content.fixture.filter(|path| !path.as_os_str().is_empty()),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    fragment_limit: Option<u64>,
    single_flight_wait_ms: Option<u64>,
    snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    fixture: Option<PathBuf>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
