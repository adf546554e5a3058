//! # Configuration Module
//!
//! This module handles application configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__, plus PORT, HOMESERVER_URL, ...)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use room_mirror::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Mirroring {} on port {}", settings.matrix.homeserver_url, settings.server.port);
//! ```

mod settings;

pub use settings::*;
