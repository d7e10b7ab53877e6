//! Native webview surfaces backed by `wry`.
//!
//! Each surface is one child `wry::WebView` of the host window, built with
//! its document so no placeholder page is ever loaded. A probe
//! script installed as an initialization script reports scroll, anchor
//! clicks and capability messages over `window.ipc`; page-load and
//! navigation handlers report load completion and blocked navigations.
//! All callbacks push [`SurfaceEvent`]s into a shared sink that the main
//! loop drains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sandframe_common::SurfaceError;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use wry::raw_window_handle;
use wry::{WebView, WebViewBuilder};

use crate::capability::CapabilityTransport;
use crate::dom::{DomNode, ElementData};
use crate::events::SurfaceEvent;
use crate::inject::{styles, InjectedDocument};
use crate::links::Anchor;
use crate::protocol::{ContentMessage, ThemeData};
use crate::surface::{
    LoadGate, ScrollRestore, Surface, SurfaceBackend, SurfaceId, SurfaceSpec,
};

type EventSink = Arc<Mutex<Vec<SurfaceEvent>>>;

/// Installed before any content script runs. Keeps its own reference to
/// `window.ipc` so content deleting it does not break reporting.
pub const PROBE_SCRIPT: &str = r#"
(function() {
    var ipc = window.ipc;
    if (!ipc) { return; }
    function send(msg) { ipc.postMessage(JSON.stringify(msg)); }

    document.addEventListener('click', function(event) {
        var node = event.target;
        while (node) {
            if (node.tagName && node.tagName.toLowerCase() === 'a' && node.href) {
                send({ kind: 'click', href: node.getAttribute('href') || '', resolved: node.href });
                event.preventDefault();
                return;
            }
            node = node.parentNode;
        }
    }, true);

    window.addEventListener('scroll', function() {
        var el = document.scrollingElement || document.body;
        if (!el) { return; }
        send({ kind: 'scroll', scrollTop: el.scrollTop, clientHeight: el.clientHeight });
    }, { passive: true });
})();
"#;

/// Messages posted by [`PROBE_SCRIPT`] and the native capability transport.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ProbeMessage {
    Click {
        href: String,
        resolved: String,
    },
    #[serde(rename_all = "camelCase")]
    Scroll {
        scroll_top: f64,
        client_height: f64,
    },
    Message {
        message: ContentMessage,
    },
}

/// URLs a freshly written document may load from.
const DOCUMENT_LOAD_PREFIXES: &[&str] = &["about:blank", "about:srcdoc", "data:"];

// =============================================================================
// BACKEND
// =============================================================================

pub struct WryBackend<W> {
    parent: Arc<W>,
    events: EventSink,
    bounds: wry::Rect,
    devtools: bool,
}

impl<W: raw_window_handle::HasWindowHandle> WryBackend<W> {
    pub fn new(parent: Arc<W>, width: u32, height: u32) -> Self {
        Self {
            parent,
            events: Arc::new(Mutex::new(Vec::new())),
            bounds: full_bounds(width, height),
            devtools: cfg!(debug_assertions),
        }
    }

    pub fn with_devtools(mut self, devtools: bool) -> Self {
        self.devtools = devtools;
        self
    }

    /// Drain all pending events.
    pub fn drain_events(&self) -> Vec<SurfaceEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => Vec::new(),
        }
    }

    /// Bounds used for surfaces created from now on.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.bounds = full_bounds(width, height);
    }
}

impl<W: raw_window_handle::HasWindowHandle> SurfaceBackend for WryBackend<W> {
    type Surface = WrySurface<W>;

    /// The webview itself is built when the first document is written, so
    /// the only page it ever loads is that document.
    fn create_surface(
        &mut self,
        id: SurfaceId,
        spec: &SurfaceSpec,
    ) -> Result<WrySurface<W>, SurfaceError> {
        debug!(surface = %id, "WebView surface allocated");
        Ok(WrySurface {
            id,
            parent: Arc::clone(&self.parent),
            events: Arc::clone(&self.events),
            bounds: self.bounds,
            devtools: self.devtools,
            visible: spec.visible,
            webview: None,
            scroll_top: Arc::new(Mutex::new(0.0)),
            allow_document_load: Arc::new(AtomicBool::new(true)),
            load_gate: LoadGate::new(),
        })
    }

    fn capability_transport(&self) -> CapabilityTransport {
        CapabilityTransport::NativeIpc
    }
}

fn full_bounds(width: u32, height: u32) -> wry::Rect {
    wry::Rect {
        position: wry::dpi::Position::Logical(wry::dpi::LogicalPosition::new(0.0, 0.0)),
        size: wry::dpi::Size::Logical(wry::dpi::LogicalSize::new(
            f64::from(width),
            f64::from(height),
        )),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn attach_ipc_handler<'a>(
    builder: WebViewBuilder<'a>,
    events: EventSink,
    scroll_top: Arc<Mutex<f64>>,
    id: SurfaceId,
) -> WebViewBuilder<'a> {
    builder.with_ipc_handler(move |request| {
        let body = request.body();
        let message = match serde_json::from_str::<ProbeMessage>(body) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    surface = %id,
                    body_len = body.len(),
                    error = %e,
                    "IPC message rejected"
                );
                return;
            }
        };

        let event = match message {
            ProbeMessage::Click { href, resolved } => SurfaceEvent::Click {
                surface: id,
                anchor: Some(Anchor {
                    href_attr: href,
                    resolved,
                }),
            },
            ProbeMessage::Scroll {
                scroll_top: top,
                client_height,
            } => {
                if let Ok(mut cached) = scroll_top.lock() {
                    *cached = top;
                }
                SurfaceEvent::Scroll {
                    surface: id,
                    scroll_top: top,
                    client_height,
                }
            }
            ProbeMessage::Message { message } => SurfaceEvent::Message {
                surface: id,
                message,
            },
        };
        if let Ok(mut evts) = events.lock() {
            evts.push(event);
        }
    })
}

/// Report `Loaded` only while `generation` is the surface's latest write.
fn attach_page_load_handler<'a>(
    builder: WebViewBuilder<'a>,
    events: EventSink,
    gate: LoadGate,
    generation: u64,
    id: SurfaceId,
) -> WebViewBuilder<'a> {
    builder.with_on_page_load_handler(move |event, url| {
        if !matches!(event, wry::PageLoadEvent::Finished) {
            return;
        }
        if !gate.is_current(generation) {
            debug!(surface = %id, generation, "stale page load ignored");
            return;
        }
        debug!(surface = %id, url = %url, "page load finished");
        if let Ok(mut evts) = events.lock() {
            evts.push(SurfaceEvent::Loaded { surface: id });
        }
    })
}

fn attach_navigation_handler<'a>(
    builder: WebViewBuilder<'a>,
    events: EventSink,
    allow_document_load: Arc<AtomicBool>,
    id: SurfaceId,
) -> WebViewBuilder<'a> {
    builder.with_navigation_handler(move |url| {
        let is_document_load = DOCUMENT_LOAD_PREFIXES.iter().any(|p| url.starts_with(p));
        if is_document_load && allow_document_load.swap(false, Ordering::SeqCst) {
            debug!(surface = %id, "document load allowed");
            return true;
        }

        warn!(surface = %id, url = %url, "navigation blocked");
        if let Ok(mut evts) = events.lock() {
            evts.push(SurfaceEvent::NavigationBlocked { surface: id, url });
        }
        false
    })
}

// =============================================================================
// SURFACE
// =============================================================================

pub struct WrySurface<W> {
    id: SurfaceId,
    parent: Arc<W>,
    events: EventSink,
    bounds: wry::Rect,
    devtools: bool,
    visible: bool,
    /// `None` until the first document is written.
    webview: Option<WebView>,
    scroll_top: Arc<Mutex<f64>>,
    allow_document_load: Arc<AtomicBool>,
    load_gate: LoadGate,
}

impl<W: raw_window_handle::HasWindowHandle> WrySurface<W> {
    fn webview(&self) -> Result<&WebView, SurfaceError> {
        self.webview
            .as_ref()
            .ok_or_else(|| SurfaceError::Script(format!("surface {} has no document", self.id)))
    }

    fn eval(&self, js: &str) -> Result<(), SurfaceError> {
        self.webview()?
            .evaluate_script(js)
            .map_err(|e| SurfaceError::Script(e.to_string()))
    }

    /// Build a fresh webview showing `html`. Any previous webview (and its
    /// callbacks) is dropped first; its loads are stale from here on.
    fn build_webview(&mut self, html: &str) -> Result<(), SurfaceError> {
        let generation = self.load_gate.begin();
        self.webview = None;
        self.allow_document_load.store(true, Ordering::SeqCst);

        let mut builder = WebViewBuilder::new()
            .with_bounds(self.bounds)
            .with_visible(self.visible)
            .with_devtools(self.devtools)
            .with_focused(false)
            .with_initialization_script(PROBE_SCRIPT);

        builder = attach_ipc_handler(
            builder,
            Arc::clone(&self.events),
            Arc::clone(&self.scroll_top),
            self.id,
        );
        builder = attach_page_load_handler(
            builder,
            Arc::clone(&self.events),
            self.load_gate.clone(),
            generation,
            self.id,
        );
        builder = attach_navigation_handler(
            builder,
            Arc::clone(&self.events),
            Arc::clone(&self.allow_document_load),
            self.id,
        );

        let webview = builder
            .with_html(html)
            .build_as_child(&*self.parent)
            .map_err(|e| SurfaceError::Write(e.to_string()))?;
        debug!(surface = %self.id, generation, "WebView built");
        self.webview = Some(webview);
        Ok(())
    }
}

/// HTML to hand to the webview. Without iframe sandboxing, a script-less
/// policy is enforced through a CSP meta element.
pub fn document_html(document: &InjectedDocument) -> String {
    let Some(csp) = document.sandbox.content_security_policy() else {
        return document.html.clone();
    };
    let mut doc = document.document.clone();
    if let Some(head) = doc.head() {
        doc.prepend_child(
            head,
            DomNode::Element(
                ElementData::new("meta")
                    .with_attr("http-equiv", "Content-Security-Policy")
                    .with_attr("content", csp),
            ),
        );
    }
    doc.to_html()
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

impl<W: raw_window_handle::HasWindowHandle> Surface for WrySurface<W> {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn write_document(&mut self, document: &InjectedDocument) -> Result<(), SurfaceError> {
        if let Ok(mut cached) = self.scroll_top.lock() {
            *cached = 0.0;
        }
        self.build_webview(&document_html(document))
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
        self.visible = visible;
        match &self.webview {
            Some(webview) => webview
                .set_visible(visible)
                .map_err(|e| SurfaceError::Script(e.to_string())),
            None => Ok(()),
        }
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top.lock().map(|v| *v).unwrap_or(0.0)
    }

    fn restore_scroll(&mut self, restore: ScrollRestore) -> Result<(), SurfaceError> {
        let target = match restore {
            ScrollRestore::Progress(progress) => format!("el.clientHeight * {progress}"),
            ScrollRestore::Offset(offset) => format!("{offset}"),
        };
        self.eval(&format!(
            "(function() {{ var el = document.scrollingElement || document.body; \
             if (el && el.scrollTop === 0) {{ el.scrollTop = {target}; }} }})();"
        ))
    }

    fn scroll_to_top(&mut self) -> Result<(), SurfaceError> {
        self.eval("window.scrollTo(0, 0);")
    }

    fn scroll_into_view(&mut self, element_id: &str) -> Result<(), SurfaceError> {
        self.eval(&format!(
            "(function() {{ var el = document.getElementById({}); if (el) {{ el.scrollIntoView(); }} }})();",
            js_string(element_id)
        ))
    }

    fn post_message(&mut self, payload: &Value) -> Result<(), SurfaceError> {
        let data = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_string());
        self.eval(&format!(
            "window.dispatchEvent(new MessageEvent('message', {{ data: {data} }}));"
        ))
    }

    fn focus(&mut self) -> Result<(), SurfaceError> {
        self.webview()?
            .focus()
            .map_err(|e| SurfaceError::Script(e.to_string()))
    }

    fn apply_theme(&mut self, theme: &ThemeData) -> Result<(), SurfaceError> {
        self.eval(&styles::theme_update_script(theme))
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.bounds = full_bounds(width, height);
        match &self.webview {
            Some(webview) => webview
                .set_bounds(self.bounds)
                .map_err(|e| SurfaceError::Script(e.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::ContentInjector;
    use crate::protocol::{ContentOptions, ContentUpdateRequest};

    #[test]
    fn probe_messages_parse() {
        let click: ProbeMessage = serde_json::from_str(
            r##"{"kind":"click","href":"#a","resolved":"about:blank#a"}"##,
        )
        .unwrap();
        assert!(matches!(click, ProbeMessage::Click { href, .. } if href == "#a"));

        let scroll: ProbeMessage =
            serde_json::from_str(r#"{"kind":"scroll","scrollTop":10,"clientHeight":100}"#)
                .unwrap();
        assert!(matches!(
            scroll,
            ProbeMessage::Scroll { scroll_top, client_height }
                if scroll_top == 10.0 && client_height == 100.0
        ));

        let message: ProbeMessage = serde_json::from_str(
            r#"{"kind":"message","message":{"command":"onmessage","data":1}}"#,
        )
        .unwrap();
        assert!(matches!(message, ProbeMessage::Message { message } if message.command == "onmessage"));
    }

    #[test]
    fn scriptless_documents_get_csp() {
        let doc = ContentInjector::new(CapabilityTransport::NativeIpc).build(
            &ContentUpdateRequest::new("<p>x</p>"),
            &ThemeData::default(),
            None,
        );
        let html = document_html(&doc);
        assert!(html.contains(
            r#"<meta http-equiv="Content-Security-Policy" content="script-src 'none'; form-action 'none'">"#
        ));
    }

    #[test]
    fn scripted_documents_pass_through() {
        let doc = ContentInjector::new(CapabilityTransport::NativeIpc).build(
            &ContentUpdateRequest::new("<p>x</p>").with_options(ContentOptions {
                allow_scripts: true,
                enable_wrapped_post_message: false,
            }),
            &ThemeData::default(),
            None,
        );
        assert_eq!(document_html(&doc), doc.html);
    }
}
