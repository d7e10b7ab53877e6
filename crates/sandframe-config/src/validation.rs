//! Configuration validation.
//!
//! Checks numeric ranges and enumerated values, collecting every problem
//! into a single `ConfigError`.

use crate::schema::SandframeConfig;
use sandframe_common::ConfigError;

/// Log levels accepted by `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &SandframeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(
        &mut errors,
        "swap.promotion_delay_ms",
        config.swap.promotion_delay_ms,
        1,
        10_000,
    );
    validate_range(
        &mut errors,
        "scroll.frame_interval_ms",
        config.scroll.frame_interval_ms,
        1,
        1_000,
    );
    validate_range(
        &mut errors,
        "window.width",
        u64::from(config.window.width),
        200,
        8192,
    );
    validate_range(
        &mut errors,
        "window.height",
        u64::from(config.window.height),
        200,
        8192,
    );

    if config.theme.name.trim().is_empty() {
        errors.push("theme.name must not be empty".into());
    }

    if !VALID_LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(format!(
            "logging.level = '{}' is not one of {}",
            config.logging.level,
            VALID_LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
