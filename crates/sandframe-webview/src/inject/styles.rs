//! Default stylesheet generation from theme variables.

use tracing::warn;

use super::sanitize::{validate_css_value, validate_variable_name};
use crate::protocol::ThemeData;

/// `id` of the injected `<style>` element.
pub const DEFAULT_STYLES_ID: &str = "_defaultStyles";

/// Body classes owned by the theme mechanism; cleared before the active
/// theme class is applied.
pub const THEME_CLASSES: &[&str] = &["theme-light", "theme-dark", "theme-high-contrast"];

const BASE_STYLES: &str = r#"
body {
	background-color: var(--background-color);
	color: var(--color);
	font-family: var(--font-family);
	font-weight: var(--font-weight);
	font-size: var(--font-size);
	margin: 0;
	padding: 0 20px;
}

img {
	max-width: 100%;
	max-height: 100%;
}

body a {
	color: var(--link-color);
}

a:focus,
input:focus,
select:focus,
textarea:focus {
	outline: 1px solid -webkit-focus-ring-color;
	outline-offset: -1px;
}

::-webkit-scrollbar {
	width: 10px;
	height: 10px;
}

::-webkit-scrollbar-thumb {
	background-color: rgba(121, 121, 121, 0.4);
}
body.theme-light::-webkit-scrollbar-thumb {
	background-color: rgba(100, 100, 100, 0.4);
}
body.theme-high-contrast::-webkit-scrollbar-thumb {
	background-color: rgba(111, 195, 223, 0.3);
}

::-webkit-scrollbar-thumb:hover {
	background-color: rgba(100, 100, 100, 0.7);
}
body.theme-light::-webkit-scrollbar-thumb:hover {
	background-color: rgba(100, 100, 100, 0.7);
}
body.theme-high-contrast::-webkit-scrollbar-thumb:hover {
	background-color: rgba(111, 195, 223, 0.8);
}

::-webkit-scrollbar-thumb:active {
	background-color: rgba(85, 85, 85, 0.8);
}
body.theme-light::-webkit-scrollbar-thumb:active {
	background-color: rgba(0, 0, 0, 0.6);
}
body.theme-high-contrast::-webkit-scrollbar-thumb:active {
	background-color: rgba(111, 195, 223, 0.8);
}
"#;

/// Generate the `:root { ... }` block. Invalid names or values are skipped
/// with a warning.
pub fn generate_css_root(theme: &ThemeData) -> String {
    let mut css = String::from(":root {");

    for (name, value) in &theme.variables {
        let validation = validate_variable_name(name).and_then(|()| validate_css_value(value));
        match validation {
            Ok(()) => {
                css.push_str(&format!(" --{name}: {};", value.trim()));
            }
            Err(e) => {
                warn!(
                    name = %name,
                    value = %value,
                    error = %e,
                    "Theme variable rejected by sanitizer"
                );
            }
        }
    }

    css.push_str(" }");
    css
}

/// Full text of the default stylesheet for `theme`.
pub fn default_stylesheet(theme: &ThemeData) -> String {
    let mut css = generate_css_root(theme);
    css.push('\n');
    css.push_str(BASE_STYLES);
    css
}

/// JS that swaps the theme on an already-rendered document: rewrites the
/// default stylesheet and the body's theme class.
pub fn theme_update_script(theme: &ThemeData) -> String {
    let css = serde_json::to_string(&default_stylesheet(theme)).unwrap_or_else(|_| "\"\"".into());
    let classes = serde_json::to_string(THEME_CLASSES).unwrap_or_else(|_| "[]".into());
    let active =
        serde_json::to_string(theme.active_theme.trim()).unwrap_or_else(|_| "\"\"".into());
    format!(
        "(function() {{ \
            var s = document.getElementById('{DEFAULT_STYLES_ID}'); \
            if (s) {{ s.textContent = {css}; }} \
            var b = document.body; if (!b) {{ return; }} \
            {classes}.forEach(function(c) {{ b.classList.remove(c); }}); \
            if ({active}) {{ b.classList.add({active}); }} \
        }})();"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn theme(vars: &[(&str, &str)]) -> ThemeData {
        ThemeData::new(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            "theme-dark",
        )
    }

    #[test]
    fn root_block_declares_each_variable() {
        let css = generate_css_root(&theme(&[("color", "#ccc"), ("font-size", "13px")]));
        assert_eq!(css, ":root { --color: #ccc; --font-size: 13px; }");
    }

    #[test]
    fn root_block_skips_injection_attempts() {
        let css = generate_css_root(&theme(&[
            ("color", "red; } body { display: none"),
            ("bad name", "#fff"),
            ("background-color", "url(https://evil.test/x)"),
            ("link-color", "#3794ff"),
        ]));
        assert_eq!(css, ":root { --link-color: #3794ff; }");
    }

    #[test]
    fn empty_theme_yields_empty_root() {
        assert_eq!(generate_css_root(&ThemeData::default()), ":root { }");
    }

    #[test]
    fn stylesheet_contains_scrollbar_variants() {
        let css = default_stylesheet(&theme(&[]));
        assert!(css.contains("body.theme-light::-webkit-scrollbar-thumb"));
        assert!(css.contains("body.theme-high-contrast::-webkit-scrollbar-thumb:active"));
        assert!(css.contains("max-width: 100%"));
        assert!(!css.contains("</style"));
    }

    #[test]
    fn theme_update_script_targets_default_styles() {
        let js = theme_update_script(&theme(&[("color", "#fff")]));
        assert!(js.contains("getElementById('_defaultStyles')"));
        assert!(js.contains("theme-high-contrast"));
        assert!(js.contains("--color: #fff;"));
    }
}
