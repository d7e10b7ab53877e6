//! In-memory surfaces with no rendering engine.
//!
//! Each surface keeps the parsed document it was given and simulates the
//! behaviour the bridge relies on: load completion, visibility, scroll
//! offsets, delivered messages and the capability grant. Content-side
//! activity (clicks, scrolls, posts) is simulated through helper methods
//! that push [`SurfaceEvent`]s into the backend's event sink, the same way
//! a real backend's callbacks do.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use ego_tree::NodeId;
use sandframe_common::SurfaceError;
use serde_json::Value;
use tracing::debug;

use crate::capability::{CapabilityError, CapabilityGrant, CapabilityTransport, ContentApi};
use crate::dom::Document;
use crate::events::SurfaceEvent;
use crate::inject::{apply_theme_class, InjectedDocument};
use crate::links::find_anchor;
use crate::protocol::{ContentMessage, ThemeData};
use crate::surface::{
    LoadGate, SandboxPolicy, ScrollRestore, Surface, SurfaceBackend, SurfaceId, SurfaceSpec,
};

/// Default client height used for progress computations.
pub const DEFAULT_CLIENT_HEIGHT: f64 = 768.0;

type EventSink = Arc<Mutex<Vec<SurfaceEvent>>>;

/// Visibility of each live surface, shared between backend and surfaces.
type Registry = Arc<Mutex<BTreeMap<SurfaceId, bool>>>;

pub struct HeadlessBackend {
    events: EventSink,
    registry: Registry,
    destroyed: Arc<Mutex<Vec<SurfaceId>>>,
    auto_load: bool,
    client_height: f64,
    fail_next_create: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            registry: Arc::new(Mutex::new(BTreeMap::new())),
            destroyed: Arc::new(Mutex::new(Vec::new())),
            auto_load: true,
            client_height: DEFAULT_CLIENT_HEIGHT,
            fail_next_create: false,
        }
    }

    /// When set, written documents report `Loaded` immediately.
    pub fn with_auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }

    pub fn with_client_height(mut self, height: f64) -> Self {
        self.client_height = height;
        self
    }

    /// Make the next `create_surface` call fail.
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    /// Drain all pending events.
    pub fn drain_events(&self) -> Vec<SurfaceEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => Vec::new(),
        }
    }

    pub fn live_surfaces(&self) -> Vec<SurfaceId> {
        self.registry
            .lock()
            .map(|r| r.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn visible_surfaces(&self) -> Vec<SurfaceId> {
        self.registry
            .lock()
            .map(|r| r.iter().filter(|(_, v)| **v).map(|(k, _)| *k).collect())
            .unwrap_or_default()
    }

    /// Surfaces destroyed so far, in destruction order.
    pub fn destroyed_surfaces(&self) -> Vec<SurfaceId> {
        self.destroyed.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceBackend for HeadlessBackend {
    type Surface = HeadlessSurface;

    fn create_surface(
        &mut self,
        id: SurfaceId,
        spec: &SurfaceSpec,
    ) -> Result<HeadlessSurface, SurfaceError> {
        if std::mem::take(&mut self.fail_next_create) {
            return Err(SurfaceError::Create(format!("surface {id} refused")));
        }
        if let Ok(mut registry) = self.registry.lock() {
            registry.insert(id, spec.visible);
        }
        debug!(surface = %id, "headless surface created");
        Ok(HeadlessSurface {
            id,
            sandbox: spec.sandbox,
            events: Arc::clone(&self.events),
            registry: Arc::clone(&self.registry),
            destroyed: Arc::clone(&self.destroyed),
            auto_load: self.auto_load,
            load_gate: LoadGate::new(),
            load_generation: 0,
            visible: spec.visible,
            document: None,
            capability: None,
            scroll_top: 0.0,
            client_height: self.client_height,
            posted: Vec::new(),
            focused: false,
            scrolled_into_view: None,
            theme: None,
        })
    }

    fn capability_transport(&self) -> CapabilityTransport {
        CapabilityTransport::NativeIpc
    }
}

// =============================================================================
// SURFACE
// =============================================================================

pub struct HeadlessSurface {
    id: SurfaceId,
    sandbox: SandboxPolicy,
    events: EventSink,
    registry: Registry,
    destroyed: Arc<Mutex<Vec<SurfaceId>>>,
    auto_load: bool,
    load_gate: LoadGate,
    load_generation: u64,
    visible: bool,
    document: Option<Document>,
    capability: Option<CapabilityGrant>,
    scroll_top: f64,
    client_height: f64,
    posted: Vec<Value>,
    focused: bool,
    scrolled_into_view: Option<String>,
    theme: Option<ThemeData>,
}

impl HeadlessSurface {
    pub fn sandbox(&self) -> SandboxPolicy {
        self.sandbox
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Serialized form of the current document.
    pub fn html(&self) -> Option<String> {
        self.document.as_ref().map(Document::to_html)
    }

    /// Payloads delivered to content, in delivery order.
    pub fn posted_messages(&self) -> &[Value] {
        &self.posted
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn scrolled_into_view(&self) -> Option<&str> {
        self.scrolled_into_view.as_deref()
    }

    pub fn client_height(&self) -> f64 {
        self.client_height
    }

    pub fn applied_theme(&self) -> Option<&ThemeData> {
        self.theme.as_ref()
    }

    // -- Content simulation --

    /// Generation of the latest document write.
    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }

    /// Report load completion of the latest document.
    pub fn fire_load(&self) {
        self.fire_load_for(self.load_generation);
    }

    /// Report load completion of the document written as `generation`.
    /// Superseded documents report nothing.
    pub fn fire_load_for(&self, generation: u64) {
        if !self.load_gate.is_current(generation) {
            debug!(surface = %self.id, generation, "stale load ignored");
            return;
        }
        self.push(SurfaceEvent::Loaded { surface: self.id });
    }

    /// Call `acquireHostApi()`. `None` if the capability was not injected.
    pub fn acquire_api(&mut self) -> Option<Result<ContentApi, CapabilityError>> {
        self.capability.as_mut().map(CapabilityGrant::acquire)
    }

    /// Post a message to the bridge as content would.
    pub fn post_from_content(&self, message: ContentMessage) {
        self.push(SurfaceEvent::Message {
            surface: self.id,
            message,
        });
    }

    /// Click on `target`, reporting the nearest enclosing anchor.
    pub fn click(&self, target: NodeId) {
        let anchor = self
            .document
            .as_ref()
            .and_then(|doc| find_anchor(doc, target));
        self.push(SurfaceEvent::Click {
            surface: self.id,
            anchor,
        });
    }

    /// Click on the element with the given `id` attribute.
    pub fn click_element(&self, element_id: &str) {
        if let Some(target) = self
            .document
            .as_ref()
            .and_then(|doc| doc.element_by_id(element_id))
        {
            self.click(target);
        }
    }

    /// User scrolled to `scroll_top`.
    pub fn scroll_to(&mut self, scroll_top: f64) {
        self.scroll_top = scroll_top;
        self.push(SurfaceEvent::Scroll {
            surface: self.id,
            scroll_top,
            client_height: self.client_height,
        });
    }

    /// Content tried to navigate away.
    pub fn navigate(&self, url: &str) {
        self.push(SurfaceEvent::NavigationBlocked {
            surface: self.id,
            url: url.to_string(),
        });
    }

    fn push(&self, event: SurfaceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Surface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn write_document(&mut self, document: &InjectedDocument) -> Result<(), SurfaceError> {
        self.load_generation = self.load_gate.begin();
        self.document = Some(document.document.clone());
        self.capability = document
            .capability
            .as_ref()
            .map(|m| CapabilityGrant::new(m.persisted_state.as_deref()));
        self.scroll_top = 0.0;
        self.scrolled_into_view = None;
        if self.auto_load {
            self.fire_load();
        }
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
        self.visible = visible;
        if let Ok(mut registry) = self.registry.lock() {
            registry.insert(self.id, visible);
        }
        Ok(())
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn restore_scroll(&mut self, restore: ScrollRestore) -> Result<(), SurfaceError> {
        if self.scroll_top != 0.0 {
            return Ok(());
        }
        self.scroll_top = match restore {
            ScrollRestore::Progress(progress) => progress * self.client_height,
            ScrollRestore::Offset(offset) => offset,
        };
        Ok(())
    }

    fn scroll_to_top(&mut self) -> Result<(), SurfaceError> {
        self.scroll_top = 0.0;
        Ok(())
    }

    fn scroll_into_view(&mut self, element_id: &str) -> Result<(), SurfaceError> {
        let found = self
            .document
            .as_ref()
            .and_then(|doc| doc.element_by_id(element_id))
            .is_some();
        if found {
            self.scrolled_into_view = Some(element_id.to_string());
        }
        Ok(())
    }

    fn post_message(&mut self, payload: &Value) -> Result<(), SurfaceError> {
        self.posted.push(payload.clone());
        Ok(())
    }

    fn focus(&mut self) -> Result<(), SurfaceError> {
        self.focused = true;
        Ok(())
    }

    fn apply_theme(&mut self, theme: &ThemeData) -> Result<(), SurfaceError> {
        if let Some(doc) = self.document.as_mut() {
            apply_theme_class(doc, &theme.active_theme);
        }
        self.theme = Some(theme.clone());
        Ok(())
    }
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.remove(&self.id);
        }
        if let Ok(mut destroyed) = self.destroyed.lock() {
            destroyed.push(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::ContentInjector;
    use crate::protocol::{ContentOptions, ContentUpdateRequest};

    fn injected(html: &str, options: ContentOptions) -> InjectedDocument {
        ContentInjector::new(CapabilityTransport::NativeIpc).build(
            &ContentUpdateRequest::new(html)
                .with_options(options)
                .with_state(r#"{"n":1}"#),
            &ThemeData::default(),
            None,
        )
    }

    #[test]
    fn write_reports_load_when_auto_loading() {
        let mut backend = HeadlessBackend::new();
        let spec = SurfaceSpec::hidden(SandboxPolicy::default());
        let mut surface = backend.create_surface(SurfaceId(1), &spec).unwrap();
        surface
            .write_document(&injected("<p>x</p>", ContentOptions::default()))
            .unwrap();
        assert_eq!(
            backend.drain_events(),
            vec![SurfaceEvent::Loaded {
                surface: SurfaceId(1)
            }]
        );
        assert!(backend.drain_events().is_empty());
    }

    #[test]
    fn no_load_event_without_auto_load() {
        let mut backend = HeadlessBackend::new().with_auto_load(false);
        let spec = SurfaceSpec::hidden(SandboxPolicy::default());
        let mut surface = backend.create_surface(SurfaceId(1), &spec).unwrap();
        surface
            .write_document(&injected("<p>x</p>", ContentOptions::default()))
            .unwrap();
        assert!(backend.drain_events().is_empty());
        surface.fire_load();
        assert_eq!(backend.drain_events().len(), 1);
    }

    #[test]
    fn load_of_superseded_document_is_ignored() {
        let mut backend = HeadlessBackend::new().with_auto_load(false);
        let spec = SurfaceSpec::hidden(SandboxPolicy::default());
        let mut surface = backend.create_surface(SurfaceId(1), &spec).unwrap();

        surface
            .write_document(&injected("<p>old</p>", ContentOptions::default()))
            .unwrap();
        let old = surface.load_generation();
        surface
            .write_document(&injected("<p>new</p>", ContentOptions::default()))
            .unwrap();
        let new = surface.load_generation();
        assert_ne!(old, new);

        surface.fire_load_for(old);
        assert!(backend.drain_events().is_empty());

        surface.fire_load_for(new);
        assert_eq!(
            backend.drain_events(),
            vec![SurfaceEvent::Loaded {
                surface: SurfaceId(1)
            }]
        );
    }

    #[test]
    fn unwritten_surface_reports_no_load() {
        let mut backend = HeadlessBackend::new().with_auto_load(false);
        let spec = SurfaceSpec::hidden(SandboxPolicy::default());
        let surface = backend.create_surface(SurfaceId(1), &spec).unwrap();
        surface.fire_load();
        assert!(backend.drain_events().is_empty());
    }

    #[test]
    fn drop_unregisters_surface() {
        let mut backend = HeadlessBackend::new();
        let spec = SurfaceSpec::hidden(SandboxPolicy::default());
        let mut surface = backend.create_surface(SurfaceId(3), &spec).unwrap();
        surface.set_visible(true).unwrap();
        assert_eq!(backend.visible_surfaces(), vec![SurfaceId(3)]);
        drop(surface);
        assert!(backend.live_surfaces().is_empty());
        assert_eq!(backend.destroyed_surfaces(), vec![SurfaceId(3)]);
    }

    #[test]
    fn capability_only_when_injected() {
        let mut backend = HeadlessBackend::new();
        let spec = SurfaceSpec::hidden(SandboxPolicy::default());
        let mut surface = backend.create_surface(SurfaceId(1), &spec).unwrap();
        surface
            .write_document(&injected("<p>x</p>", ContentOptions::default()))
            .unwrap();
        assert!(surface.acquire_api().is_none());

        surface
            .write_document(&injected(
                "<p>x</p>",
                ContentOptions {
                    allow_scripts: true,
                    enable_wrapped_post_message: true,
                },
            ))
            .unwrap();
        assert!(surface.acquire_api().unwrap().is_ok());
        assert!(surface.acquire_api().unwrap().is_err());
    }

    #[test]
    fn restore_scroll_only_from_top() {
        let mut backend = HeadlessBackend::new().with_client_height(400.0);
        let spec = SurfaceSpec::hidden(SandboxPolicy::default());
        let mut surface = backend.create_surface(SurfaceId(1), &spec).unwrap();
        surface.restore_scroll(ScrollRestore::Progress(0.5)).unwrap();
        assert_eq!(surface.scroll_top(), 200.0);
        surface.restore_scroll(ScrollRestore::Offset(10.0)).unwrap();
        assert_eq!(surface.scroll_top(), 200.0);
    }

    #[test]
    fn create_failure_is_reported_once() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next_create();
        let spec = SurfaceSpec::hidden(SandboxPolicy::default());
        assert!(backend.create_surface(SurfaceId(1), &spec).is_err());
        assert!(backend.create_surface(SurfaceId(2), &spec).is_ok());
    }
}
