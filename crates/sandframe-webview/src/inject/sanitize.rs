//! Theme variable sanitization to prevent CSS injection.
//!
//! Theme variables are written verbatim into a `<style>` element of the
//! untrusted document, so both halves are checked:
//! - names must be plain identifiers (`[A-Za-z0-9_-]+`), emitted as `--name`
//! - values must not contain structural characters or active CSS:
//!   `;`, `{`, `}`, `<`, `>`, `expression(`, `url(`, `javascript:`,
//!   `@import`, `@charset`, `behavior:`, `-moz-binding`

use std::sync::OnceLock;

use regex::Regex;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"))
}

/// Validate a theme variable name (without the leading `--`).
pub fn validate_variable_name(name: &str) -> Result<(), String> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(format!("Invalid theme variable name: '{name}'"))
    }
}

/// Validate a theme variable value.
pub fn validate_css_value(value: &str) -> Result<(), String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err("Empty CSS value".to_string());
    }

    check_injection_patterns(trimmed)
}

/// Check for common CSS injection patterns.
fn check_injection_patterns(value: &str) -> Result<(), String> {
    let lower = value.to_lowercase();

    let dangerous = [
        "expression(",
        "url(",
        "javascript:",
        "@import",
        "@charset",
        "behavior:",
        "-moz-binding",
    ];

    for pattern in &dangerous {
        if lower.contains(pattern) {
            return Err(format!("CSS injection blocked: contains '{pattern}'"));
        }
    }

    for ch in [';', '{', '}', '<', '>'] {
        if value.contains(ch) {
            return Err(format!("CSS injection blocked: contains '{ch}'"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifier_names() {
        assert!(validate_variable_name("background-color").is_ok());
        assert!(validate_variable_name("font_size").is_ok());
        assert!(validate_variable_name("color2").is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        assert!(validate_variable_name("").is_err());
        assert!(validate_variable_name("a b").is_err());
        assert!(validate_variable_name("x:1;}").is_err());
    }

    #[test]
    fn accepts_common_theme_values() {
        assert!(validate_css_value("#1e1e1e").is_ok());
        assert!(validate_css_value("rgba(0, 0, 0, 0.5)").is_ok());
        assert!(validate_css_value("-apple-system, 'Segoe UI', sans-serif").is_ok());
        assert!(validate_css_value("normal").is_ok());
        assert!(validate_css_value("13px").is_ok());
    }

    #[test]
    fn rejects_injection_expression() {
        assert!(validate_css_value("expression(alert(1))").is_err());
    }

    #[test]
    fn rejects_injection_url() {
        assert!(validate_css_value("URL(https://evil.test)").is_err());
    }

    #[test]
    fn rejects_injection_semicolon_and_braces() {
        assert!(validate_css_value("red; background: blue").is_err());
        assert!(validate_css_value("#fff } body { color: red").is_err());
    }

    #[test]
    fn rejects_style_tag_breakout() {
        assert!(validate_css_value("red</style><script>alert(1)</script>").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_css_value("   ").is_err());
    }
}
