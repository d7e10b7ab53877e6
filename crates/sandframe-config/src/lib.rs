//! Sandframe configuration system.
//!
//! TOML-based configuration for the bridge: frame swap timing, scroll
//! notification cadence, the initial theme, the native window, and logging.
//! All sections use defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sandframe_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    DevelopmentConfig, LoggingConfig, SandframeConfig, ScrollConfig, SwapConfig, ThemeConfig,
    WindowConfig, CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use sandframe_common::ConfigError;

/// Load config from `path`, or from the platform default location when
/// `path` is `None`, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<SandframeConfig, ConfigError> {
    let config = match path {
        Some(p) => toml_loader::load_from_path(p)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &SandframeConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
