//! Anchor resolution and click classification.

use ego_tree::NodeId;
use url::Url;

use crate::dom::Document;

/// Address of a document with no `<base>` and no URL of its own.
pub const BLANK_URL: &str = "about:blank";

/// What a click on an anchor should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    ScrollToTop,
    /// Scroll the element with this id into view.
    ScrollToFragment(String),
    /// Hand the resolved address to the host.
    OpenExternal(String),
}

/// An anchor's raw `href` plus the address it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href_attr: String,
    pub resolved: String,
}

impl Anchor {
    pub fn new(href_attr: impl Into<String>, base: Option<&str>) -> Self {
        let href_attr = href_attr.into();
        let resolved = resolve_href(&href_attr, base);
        Self {
            href_attr,
            resolved,
        }
    }

    /// Fragment of the resolved address, without `#`; `None` when empty.
    pub fn fragment(&self) -> Option<&str> {
        self.resolved
            .split_once('#')
            .map(|(_, f)| f)
            .filter(|f| !f.is_empty())
    }

    /// Decide what a click on this anchor does, given the document's base.
    pub fn classify(&self, base: Option<&str>) -> LinkAction {
        if self.href_attr == "#" {
            return LinkAction::ScrollToTop;
        }

        if let Some(fragment) = self.fragment() {
            let is_local = self.href_attr == format!("#{fragment}");
            let under_base = base
                .map(normalize_base)
                .is_some_and(|base| self.resolved.contains(&base));
            if is_local || under_base {
                return LinkAction::ScrollToFragment(fragment.to_string());
            }
        }

        LinkAction::OpenExternal(self.resolved.clone())
    }
}

/// Resolve `href` against `base` the way a browser fills `anchor.href`.
pub fn resolve_href(href: &str, base: Option<&str>) -> String {
    let href = href.trim();
    let base = base
        .and_then(|b| Url::parse(b).ok())
        .or_else(|| Url::parse(BLANK_URL).ok());

    if let Ok(absolute) = Url::parse(href) {
        return absolute.to_string();
    }
    if let Some(joined) = base.as_ref().and_then(|b| b.join(href).ok()) {
        return joined.to_string();
    }
    if href.starts_with('#') {
        return format!("{BLANK_URL}{href}");
    }
    href.to_string()
}

fn normalize_base(base: &str) -> String {
    Url::parse(base)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| base.to_string())
}

/// Nearest anchor with an `href`, walking up from `target`.
pub fn find_anchor(doc: &Document, target: NodeId) -> Option<Anchor> {
    let base = doc.base_href();
    doc.ancestors_inclusive(target)
        .into_iter()
        .filter_map(|id| doc.element(id))
        .find(|el| el.name.eq_ignore_ascii_case("a") && el.has_attr("href"))
        .and_then(|el| el.attr("href"))
        .map(|href| Anchor::new(href, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_only_scrolls_to_top() {
        let anchor = Anchor::new("#", None);
        assert_eq!(anchor.classify(None), LinkAction::ScrollToTop);
    }

    #[test]
    fn local_fragment_scrolls_into_view() {
        let anchor = Anchor::new("#section1", None);
        assert_eq!(anchor.resolved, "about:blank#section1");
        assert_eq!(
            anchor.classify(None),
            LinkAction::ScrollToFragment("section1".into())
        );
    }

    #[test]
    fn fragment_under_base_scrolls_into_view() {
        let base = Some("https://docs.test/guide/");
        let anchor = Anchor::new("page.html#intro", base);
        assert_eq!(anchor.resolved, "https://docs.test/guide/page.html#intro");
        assert_eq!(
            anchor.classify(base),
            LinkAction::ScrollToFragment("intro".into())
        );
    }

    #[test]
    fn fragment_elsewhere_opens_external() {
        let base = Some("https://docs.test/guide/");
        let anchor = Anchor::new("https://other.test/x#intro", base);
        assert_eq!(
            anchor.classify(base),
            LinkAction::OpenExternal("https://other.test/x#intro".into())
        );
    }

    #[test]
    fn plain_link_opens_external() {
        let anchor = Anchor::new("https://example.test/a", None);
        assert_eq!(
            anchor.classify(None),
            LinkAction::OpenExternal("https://example.test/a".into())
        );
    }

    #[test]
    fn relative_link_resolves_against_base() {
        assert_eq!(
            resolve_href("../img/a.png", Some("https://x.test/docs/p/")),
            "https://x.test/docs/img/a.png"
        );
    }

    #[test]
    fn find_anchor_walks_up_from_child() {
        let doc = Document::parse(r#"<a href="https://e.test/"><span id="t">go</span></a>"#);
        let target = doc.element_by_id("t").unwrap();
        let anchor = find_anchor(&doc, target).unwrap();
        assert_eq!(anchor.href_attr, "https://e.test/");
    }

    #[test]
    fn find_anchor_ignores_anchor_without_href() {
        let doc = Document::parse(r#"<a name="x"><span id="t">go</span></a>"#);
        let target = doc.element_by_id("t").unwrap();
        assert!(find_anchor(&doc, target).is_none());
    }

    #[test]
    fn find_anchor_uses_document_base() {
        let doc = Document::parse(
            r#"<head><base href="https://b.test/root/"></head><a id="a" href="x">x</a>"#,
        );
        let a = doc.element_by_id("a").unwrap();
        assert_eq!(find_anchor(&doc, a).unwrap().resolved, "https://b.test/root/x");
    }
}
