//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::application::services::MirrorOptions;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Remote homeserver configuration
    pub matrix: MatrixSettings,

    /// Room mirror tuning
    pub mirror: MirrorSettings,

    /// Background task intervals
    pub scheduler: SchedulerSettings,

    /// Page sizes per listing
    pub pagination: PaginationSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// Homeserver connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixSettings {
    /// Base URL of the homeserver (e.g., "https://matrix.org")
    pub homeserver_url: String,

    /// Static access token sent with every request, if the homeserver needs one
    #[serde(default)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Timeline events fetched by the initial sync
    pub initial_timeline_limit: usize,

    /// Maximum events fetched per forward sync
    pub forward_sync_limit: usize,

    /// Maximum public directory entries kept
    pub directory_limit: usize,
}

/// Room mirror configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorSettings {
    /// Events requested per backfill fetch
    pub backfill_batch: usize,

    /// Fetches spent looking for an unknown anchor before giving up
    pub anchor_search_attempts: usize,

    /// Largest accepted timeline offset
    pub max_offset: usize,

    /// Only serve rooms listed in the public directory
    pub public_only: bool,
}

/// Background scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// Forward sync period in seconds (default: 60)
    pub forward_sync_interval_secs: u64,

    /// Directory refresh period in seconds (default: 3600)
    pub directory_refresh_interval_secs: u64,

    /// How long a directory snapshot counts as fresh, in seconds (default: 1800).
    /// Must be shorter than the refresh interval or scheduled refreshes get skipped.
    pub directory_freshness_secs: u64,
}

/// Page sizes for the view.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    pub public_rooms_page_size: usize,
    pub timeline_page_size: usize,
    pub members_page_size: usize,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if a value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let port = std::env::var("SERVER_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok();

        Self::builder(&environment)?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__SERVER__PORT=8000 -> server.port = 8000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", port)?
            .set_override_option("matrix.homeserver_url", std::env::var("HOMESERVER_URL").ok())?
            .set_override_option("matrix.access_token", std::env::var("MATRIX_ACCESS_TOKEN").ok())?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    /// Defaults only, no files or environment. Used by tests.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder("test")?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("matrix.homeserver_url", "https://matrix.org")?
            .set_default("matrix.request_timeout_secs", 30)?
            .set_default("matrix.connect_timeout_secs", 10)?
            .set_default("matrix.initial_timeline_limit", 20)?
            .set_default("matrix.forward_sync_limit", 100)?
            .set_default("matrix.directory_limit", 500)?
            .set_default("mirror.backfill_batch", 50)?
            .set_default("mirror.anchor_search_attempts", 3)?
            .set_default("mirror.max_offset", 10_000)?
            .set_default("mirror.public_only", false)?
            .set_default("scheduler.forward_sync_interval_secs", 60)?
            .set_default("scheduler.directory_refresh_interval_secs", 3600)?
            .set_default("scheduler.directory_freshness_secs", 1800)?
            .set_default("pagination.public_rooms_page_size", 20)?
            .set_default("pagination.timeline_page_size", 20)?
            .set_default("pagination.members_page_size", 20)?
            .set_default("cors.allowed_origins", Vec::<String>::new())
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let url = &self.matrix.homeserver_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Message(format!(
                "matrix.homeserver_url must be an http(s) URL, got {:?}",
                url
            )));
        }

        let sizes = [
            ("matrix.initial_timeline_limit", self.matrix.initial_timeline_limit),
            ("matrix.forward_sync_limit", self.matrix.forward_sync_limit),
            ("matrix.directory_limit", self.matrix.directory_limit),
            ("mirror.backfill_batch", self.mirror.backfill_batch),
            ("mirror.anchor_search_attempts", self.mirror.anchor_search_attempts),
            ("pagination.public_rooms_page_size", self.pagination.public_rooms_page_size),
            ("pagination.timeline_page_size", self.pagination.timeline_page_size),
            ("pagination.members_page_size", self.pagination.members_page_size),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Message(format!("{} must be greater than zero", name)));
        }

        if self.scheduler.forward_sync_interval_secs == 0
            || self.scheduler.directory_refresh_interval_secs == 0
        {
            return Err(ConfigError::Message(
                "scheduler intervals must be greater than zero".into(),
            ));
        }

        // The snapshot timestamp is taken after the fetch returns, so a window
        // as long as the interval still counts as fresh on the next tick.
        if self.scheduler.directory_freshness_secs >= self.scheduler.directory_refresh_interval_secs {
            return Err(ConfigError::Message(format!(
                "scheduler.directory_freshness_secs ({}) must be shorter than \
                 scheduler.directory_refresh_interval_secs ({})",
                self.scheduler.directory_freshness_secs,
                self.scheduler.directory_refresh_interval_secs
            )));
        }

        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl MirrorSettings {
    pub fn options(&self) -> MirrorOptions {
        MirrorOptions {
            backfill_batch: self.backfill_batch,
            anchor_search_attempts: self.anchor_search_attempts,
            max_offset: self.max_offset,
        }
    }
}

impl SchedulerSettings {
    pub fn forward_sync_interval(&self) -> Duration {
        Duration::from_secs(self.forward_sync_interval_secs)
    }

    pub fn directory_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.directory_refresh_interval_secs)
    }

    pub fn directory_freshness(&self) -> Duration {
        Duration::from_secs(self.directory_freshness_secs)
    }
}
