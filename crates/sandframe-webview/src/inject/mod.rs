//! Content injection: raw HTML → self-contained, sandbox-ready document.
//!
//! The transform is pure and total. Given the same request, theme and base
//! it always yields the same document.

pub mod sanitize;
pub mod styles;

use crate::capability::{capability_script, CapabilityTransport};
use crate::dom::{Document, DomNode, ElementData};
use crate::links::resolve_href;
use crate::protocol::{ContentUpdateRequest, ThemeData};
use crate::surface::SandboxPolicy;

pub use styles::{DEFAULT_STYLES_ID, THEME_CLASSES};

/// Output of [`ContentInjector::build`].
#[derive(Debug, Clone)]
pub struct InjectedDocument {
    /// Parsed, transformed document.
    pub document: Document,
    /// Serialized form of `document`.
    pub html: String,
    /// Present when the capability script was injected.
    pub capability: Option<CapabilityManifest>,
    pub sandbox: SandboxPolicy,
}

/// What a native backend needs to provide the capability object itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityManifest {
    pub persisted_state: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentInjector {
    transport: CapabilityTransport,
}

impl ContentInjector {
    pub fn new(transport: CapabilityTransport) -> Self {
        Self { transport }
    }

    pub fn build(
        &self,
        request: &ContentUpdateRequest,
        theme: &ThemeData,
        session_base_url: Option<&str>,
    ) -> InjectedDocument {
        let mut document = Document::parse(&request.html);

        let base_url = request
            .base_url
            .as_deref()
            .or(session_base_url)
            .filter(|b| !b.trim().is_empty());
        let effective_base = document
            .base_href()
            .map(str::to_string)
            .or_else(|| base_url.map(str::to_string));

        title_anchors(&mut document, effective_base.as_deref());

        // Each insertion goes first in <head>, so the final order is
        // style, capability script, base, original children.
        if let (Some(base), None) = (base_url, document.base_href()) {
            prepend_to_head(
                &mut document,
                DomNode::Element(ElementData::new("base").with_attr("href", base)),
            );
        }

        let capability = if request.options.enable_wrapped_post_message {
            let script = capability_script(request.persisted_state.as_deref(), self.transport);
            prepend_element_with_text(&mut document, ElementData::new("script"), script);
            Some(CapabilityManifest {
                persisted_state: request.persisted_state.clone(),
            })
        } else {
            None
        };

        prepend_element_with_text(
            &mut document,
            ElementData::new("style").with_attr("id", DEFAULT_STYLES_ID),
            styles::default_stylesheet(theme),
        );

        apply_theme_class(&mut document, &theme.active_theme);

        let html = document.to_html();
        InjectedDocument {
            document,
            html,
            capability,
            sandbox: SandboxPolicy::from_options(&request.options),
        }
    }
}

/// Give every anchor without a `title` its resolved address.
fn title_anchors(document: &mut Document, base: Option<&str>) {
    for id in document.elements_named("a") {
        document.update_element(id, |el| {
            if el.has_attr("title") {
                return;
            }
            if let Some(href) = el.attr("href").map(str::to_string) {
                el.set_attr("title", resolve_href(&href, base));
            }
        });
    }
}

fn prepend_to_head(document: &mut Document, node: DomNode) -> Option<ego_tree::NodeId> {
    let head = document.head()?;
    document.prepend_child(head, node)
}

fn prepend_element_with_text(document: &mut Document, element: ElementData, text: String) {
    if let Some(id) = prepend_to_head(document, DomNode::Element(element)) {
        document.append_child(id, DomNode::Text(text));
    }
}

/// Swap the body's theme class for `active`.
pub fn apply_theme_class(document: &mut Document, active: &str) {
    if let Some(body) = document.body() {
        document.update_element(body, |el| el.replace_classes(THEME_CLASSES, active));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ContentOptions;
    use std::collections::BTreeMap;

    fn theme() -> ThemeData {
        let mut vars = BTreeMap::new();
        vars.insert("color".to_string(), "#cccccc".to_string());
        ThemeData::new(vars, "theme-dark")
    }

    fn head_children(doc: &Document) -> Vec<String> {
        let head = doc.head().unwrap();
        doc.node(head)
            .unwrap()
            .children()
            .filter_map(|c| match c.value() {
                DomNode::Element(el) => Some(el.name.clone()),
                _ => None,
            })
            .collect()
    }

    fn scripted() -> ContentOptions {
        ContentOptions {
            allow_scripts: true,
            enable_wrapped_post_message: true,
        }
    }

    #[test]
    fn head_order_is_style_script_base_original() {
        let req = ContentUpdateRequest::new("<head><title>t</title></head><p>x</p>")
            .with_options(scripted())
            .with_base_url("https://b.test/");
        let out = ContentInjector::default().build(&req, &theme(), None);
        assert_eq!(
            head_children(&out.document),
            ["style", "script", "base", "title"]
        );
        assert!(out.capability.is_some());
    }

    #[test]
    fn plain_content_gets_only_styles() {
        let req = ContentUpdateRequest::new("<p>hi</p>");
        let out = ContentInjector::default().build(&req, &theme(), None);
        assert_eq!(head_children(&out.document), ["style"]);
        assert!(out.capability.is_none());
        assert!(!out.sandbox.allow_scripts);
        assert!(out.html.starts_with("<!DOCTYPE html>"));
        assert!(out.html.contains(r#"<style id="_defaultStyles">:root { --color: #cccccc; }"#));
    }

    #[test]
    fn existing_base_is_kept() {
        let req = ContentUpdateRequest::new(r#"<head><base href="https://own.test/"></head>"#)
            .with_base_url("https://b.test/");
        let out = ContentInjector::default().build(&req, &theme(), Some("https://s.test/"));
        assert_eq!(out.document.elements_named("base").len(), 1);
        assert_eq!(out.document.base_href(), Some("https://own.test/"));
    }

    #[test]
    fn request_base_wins_over_session_base() {
        let req = ContentUpdateRequest::new("<p>x</p>").with_base_url("https://req.test/");
        let out = ContentInjector::default().build(&req, &theme(), Some("https://s.test/"));
        assert_eq!(out.document.base_href(), Some("https://req.test/"));

        let req = ContentUpdateRequest::new("<p>x</p>");
        let out = ContentInjector::default().build(&req, &theme(), Some("https://s.test/"));
        assert_eq!(out.document.base_href(), Some("https://s.test/"));
    }

    #[test]
    fn anchors_get_titles_but_keep_existing() {
        let req = ContentUpdateRequest::new(
            r#"<a id="a" href="page.html">a</a><a id="b" href="x" title="keep">b</a>"#,
        )
        .with_base_url("https://b.test/docs/");
        let out = ContentInjector::default().build(&req, &theme(), None);
        let a = out.document.element_by_id("a").unwrap();
        let b = out.document.element_by_id("b").unwrap();
        assert_eq!(
            out.document.element(a).unwrap().attr("title"),
            Some("https://b.test/docs/page.html")
        );
        assert_eq!(out.document.element(b).unwrap().attr("title"), Some("keep"));
    }

    #[test]
    fn theme_class_replaces_previous() {
        let req = ContentUpdateRequest::new(r#"<body class="theme-light own"><p>x</p></body>"#);
        let out = ContentInjector::default().build(&req, &theme(), None);
        let body = out.document.body().unwrap();
        assert_eq!(
            out.document.element(body).unwrap().attr("class"),
            Some("own theme-dark")
        );
    }

    #[test]
    fn capability_script_embeds_escaped_state() {
        let req = ContentUpdateRequest::new("<p>x</p>")
            .with_options(scripted())
            .with_state(r#"{"s":"</script>"}"#);
        let out = ContentInjector::new(CapabilityTransport::NativeIpc).build(&req, &theme(), None);
        assert!(out.html.contains("acquireHostApi"));
        assert!(!out.html.contains(r#"</script>"}"#));
        assert_eq!(
            out.capability.unwrap().persisted_state.as_deref(),
            Some(r#"{"s":"</script>"}"#)
        );
    }

    #[test]
    fn malformed_html_still_builds() {
        let req = ContentUpdateRequest::new("<div><p>unclosed <b>bold");
        let out = ContentInjector::default().build(&req, &theme(), None);
        assert!(out.html.contains("unclosed"));
        assert!(out.document.body().is_some());
    }
}
