//! Owned, mutable HTML document model.
//!
//! Documents are parsed with the html5ever-backed `scraper` crate (which never
//! fails: malformed markup still yields an `html`/`head`/`body` skeleton) and
//! copied into an `ego_tree` arena we can edit and serialize back to text.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef, Tree};

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text children are emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "noscript",
];

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Document,
    Doctype(String),
    Comment(String),
    Text(String),
    Element(ElementData),
}

/// An element's tag name and attributes, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Remove every class in `remove`, then append `add` if it is non-empty
    /// and not already present.
    pub fn replace_classes(&mut self, remove: &[&str], add: &str) {
        let mut kept: Vec<String> = self
            .classes()
            .filter(|c| !remove.contains(c))
            .map(str::to_string)
            .collect();
        let add = add.trim();
        if !add.is_empty() && !kept.iter().any(|c| c == add) {
            kept.push(add.to_string());
        }
        self.set_attr("class", kept.join(" "));
    }

    fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// A parsed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    tree: Tree<DomNode>,
}

impl Document {
    /// Parse `html` as a full document. Never fails.
    pub fn parse(html: &str) -> Self {
        let parsed = scraper::Html::parse_document(html);
        let mut tree = Tree::new(DomNode::Document);

        let mut ids = HashMap::new();
        ids.insert(parsed.tree.root().id(), tree.root().id());

        for node in parsed.tree.root().descendants().skip(1) {
            let Some(parent) = node.parent() else {
                continue;
            };
            let Some(&target) = ids.get(&parent.id()) else {
                continue;
            };
            let value = match node.value() {
                scraper::Node::Element(el) => DomNode::Element(ElementData {
                    name: el.name().to_string(),
                    attrs: el
                        .attrs
                        .iter()
                        .map(|(name, value)| {
                            (
                                qualified_name(name.prefix.as_deref(), &name.local),
                                String::from(&**value),
                            )
                        })
                        .collect(),
                }),
                scraper::Node::Text(text) => DomNode::Text((**text).to_owned()),
                scraper::Node::Comment(comment) => DomNode::Comment((**comment).to_owned()),
                scraper::Node::Doctype(doctype) => DomNode::Doctype(doctype.name().to_string()),
                _ => continue,
            };
            if let Some(mut parent_mut) = tree.get_mut(target) {
                let id = parent_mut.append(value).id();
                ids.insert(node.id(), id);
            }
        }

        Self { tree }
    }

    pub fn root(&self) -> NodeRef<'_, DomNode> {
        self.tree.root()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, DomNode>> {
        self.tree.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.tree.get(id)?.value() {
            DomNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Run `f` on the element at `id`; `None` if `id` is not an element.
    pub fn update_element<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut ElementData) -> R,
    ) -> Option<R> {
        let mut node = self.tree.get_mut(id)?;
        match node.value() {
            DomNode::Element(el) => Some(f(el)),
            _ => None,
        }
    }

    /// All elements named `tag`, in document order.
    pub fn elements_named(&self, tag: &str) -> Vec<NodeId> {
        self.tree
            .root()
            .descendants()
            .filter(|n| matches!(n.value(), DomNode::Element(el) if el.is(tag)))
            .map(|n| n.id())
            .collect()
    }

    pub fn first_element_named(&self, tag: &str) -> Option<NodeId> {
        self.tree
            .root()
            .descendants()
            .find(|n| matches!(n.value(), DomNode::Element(el) if el.is(tag)))
            .map(|n| n.id())
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_element_named("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.first_element_named("body")
    }

    /// The element whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.tree
            .root()
            .descendants()
            .find(|n| matches!(n.value(), DomNode::Element(el) if el.attr("id") == Some(id)))
            .map(|n| n.id())
    }

    /// `href` of the first `<base>` element, if any.
    pub fn base_href(&self) -> Option<&str> {
        self.elements_named("base")
            .into_iter()
            .filter_map(|id| self.element(id))
            .find_map(|el| el.attr("href"))
    }

    /// `id` followed by its ancestors up to (excluding) the document node.
    pub fn ancestors_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.tree.get(id) else {
            return Vec::new();
        };
        std::iter::once(node)
            .chain(node.ancestors())
            .filter(|n| !matches!(n.value(), DomNode::Document))
            .map(|n| n.id())
            .collect()
    }

    /// Insert `value` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, value: DomNode) -> Option<NodeId> {
        let mut parent = self.tree.get_mut(parent)?;
        Some(parent.prepend(value).id())
    }

    /// Insert `value` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, value: DomNode) -> Option<NodeId> {
        let mut parent = self.tree.get_mut(parent)?;
        Some(parent.append(value).id())
    }

    /// Serialize to HTML text with an explicit `<!DOCTYPE html>` so the
    /// rendering surface stays in standards mode.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        for child in self.tree.root().children() {
            write_node(child, &mut out);
        }
        out
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// `prefix:local` for namespaced attributes (`xlink:href`, `xml:lang`).
fn qualified_name(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn write_node(node: NodeRef<'_, DomNode>, out: &mut String) {
    match node.value() {
        DomNode::Document | DomNode::Doctype(_) => {}
        DomNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        DomNode::Text(text) => {
            let raw = node.parent().is_some_and(|p| {
                matches!(p.value(), DomNode::Element(el)
                    if RAW_TEXT_ELEMENTS.iter().any(|t| el.is(t)))
            });
            if raw {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        DomNode::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.iter().any(|t| el.is(t)) {
                return;
            }
            for child in node.children() {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
