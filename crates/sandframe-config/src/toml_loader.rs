//! TOML config file loading and creation.

use crate::schema::SandframeConfig;
use crate::validation;
use sandframe_common::ConfigError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields.
/// If validation fails, a warning is logged and the default config is
/// returned.
pub fn load_from_path(path: &Path) -> Result<SandframeConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: SandframeConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
        warn!("falling back to default config");
        return Ok(SandframeConfig::default());
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/sandframe/config.toml`
/// On Linux: `~/.config/sandframe/config.toml`
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<SandframeConfig, ConfigError> {
    let path = default_config_path()?;

    if !path.exists() {
        info!("no config found at {}, creating default", path.display());
        create_default_config(&path)?;
        return Ok(SandframeConfig::default());
    }

    load_from_path(&path)
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("sandframe").join("config.toml"))
}

/// Create a default TOML config file with documentation comments.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, default_config_toml()).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

/// Generate the default TOML config content with comments.
fn default_config_toml() -> String {
    r##"# Sandframe Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[swap]
# promotion_delay_ms = 200   # 1-10000, promote even if no load signal arrives

[scroll]
# frame_interval_ms = 16     # 1-1000, at most one did-scroll per interval

[theme]
name = "theme-dark"

[theme.variables]
# background-color = "#1e1e1e"
# color = "#d4d4d4"
# font-family = "-apple-system, 'Segoe UI', sans-serif"
# font-weight = "normal"
# font-size = "13px"
# link-color = "#3794ff"

[window]
# title = "Sandframe"
# width = 1024               # 200-8192
# height = 768               # 200-8192

[development]
# devtools = false           # blocked navigations request a reload

[logging]
# level = "info"             # trace, debug, info, warn, error
"##
    .to_string()
}
