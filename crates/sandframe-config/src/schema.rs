//! Configuration schema types for Sandframe.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults below.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

// =============================================================================
// Swap Config
// =============================================================================

/// Frame swap policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Upper bound on how long a pending surface waits for its load signal
    /// before it is promoted anyway.
    pub promotion_delay_ms: u64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            promotion_delay_ms: 200,
        }
    }
}

impl SwapConfig {
    pub fn promotion_delay(&self) -> Duration {
        Duration::from_millis(self.promotion_delay_ms)
    }
}

// =============================================================================
// Scroll Config
// =============================================================================

/// Scroll notification cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Length of one rendering tick; at most one `did-scroll` per tick.
    pub frame_interval_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
        }
    }
}

impl ScrollConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

// =============================================================================
// Theme Config
// =============================================================================

/// Initial theme, used until the host sends its first `styles` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Body class applied to injected documents.
    pub name: String,
    /// CSS custom properties (without the leading `--`).
    pub variables: BTreeMap<String, String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        let variables = [
            ("background-color", "#1e1e1e"),
            ("color", "#d4d4d4"),
            ("font-family", "-apple-system, 'Segoe UI', sans-serif"),
            ("font-weight", "normal"),
            ("font-size", "13px"),
            ("link-color", "#3794ff"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            name: "theme-dark".into(),
            variables,
        }
    }
}

// =============================================================================
// Window Config
// =============================================================================

/// Native window hosting the surfaces (windowed mode only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Sandframe".into(),
            width: 1024,
            height: 768,
        }
    }
}

// =============================================================================
// Development / Logging Config
// =============================================================================

/// Development-mode switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevelopmentConfig {
    /// Start the session as if devtools had already been opened: blocked
    /// navigations request a reload instead of being swallowed.
    pub devtools: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// =============================================================================
// Root Config
// =============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SandframeConfig {
    pub swap: SwapConfig,
    pub scroll: ScrollConfig,
    pub theme: ThemeConfig,
    pub window: WindowConfig,
    pub development: DevelopmentConfig,
    pub logging: LoggingConfig,
}
