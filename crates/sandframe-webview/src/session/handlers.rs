//! Host message and surface event dispatch.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::events::{Disposition, SurfaceEvent};
use crate::links::{Anchor, LinkAction};
use crate::protocol::{BridgeMessage, ContentMessage, HostMessage, ThemeData};
use crate::relay::Delivery;
use crate::surface::{Surface, SurfaceBackend, SurfaceId};

use super::BridgeSession;

impl<B: SurfaceBackend> BridgeSession<B> {
    // =========================================================================
    // HOST -> BRIDGE
    // =========================================================================

    pub fn handle_host_message(&mut self, message: HostMessage, now: Instant) {
        debug!(session = %self.id, channel = message.channel(), "host message");
        match message {
            HostMessage::BaseUrl(url) => {
                self.base_url = Some(url);
            }
            HostMessage::Styles(theme) => self.apply_theme(theme),
            HostMessage::Focus => {
                if let Some(active) = self.active.as_mut() {
                    if let Err(e) = active.surface.focus() {
                        warn!(session = %self.id, error = %e, "failed to focus surface");
                    }
                }
            }
            HostMessage::Content(request) => self.update_content(request, now),
            HostMessage::Message(payload) => self.send_to_content(payload),
            HostMessage::InitialScrollPosition(progress) => {
                self.initial_scroll_progress = Some(progress);
            }
            HostMessage::DevtoolsOpened => {
                if !self.development_mode {
                    info!(session = %self.id, "development mode enabled");
                }
                self.development_mode = true;
            }
        }
    }

    fn apply_theme(&mut self, theme: ThemeData) {
        self.theme = theme;
        for slot in [self.active.as_mut(), self.pending.as_mut()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = slot.surface.apply_theme(&self.theme) {
                warn!(surface = %slot.id(), error = %e, "failed to apply theme");
            }
        }
    }

    fn send_to_content(&mut self, payload: serde_json::Value) {
        let has_active = self.active.is_some();
        let has_pending = self.pending.is_some();
        match self.relay.send(payload, has_active, has_pending) {
            Delivery::Deliver(payload) => {
                if let Some(active) = self.active.as_mut() {
                    if let Err(e) = active.surface.post_message(&payload) {
                        warn!(session = %self.id, surface = %active.id(), error = %e, "failed to deliver message");
                    }
                }
            }
            Delivery::Queued => {
                debug!(session = %self.id, queued = self.relay.len(), "message queued for pending surface");
            }
            Delivery::Dropped => {
                debug!(session = %self.id, "message dropped: no surface");
            }
        }
    }

    // =========================================================================
    // SURFACE -> BRIDGE
    // =========================================================================

    /// Dispatch a surface event. Events from surfaces that are no longer
    /// known are ignored; only the active surface may click, scroll or post.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) -> Disposition {
        match event {
            SurfaceEvent::Loaded { surface } => {
                self.on_loaded(surface);
                Disposition::Default
            }
            SurfaceEvent::NavigationBlocked { surface, url } => {
                self.on_navigation_blocked(surface, &url);
                Disposition::Prevented
            }
            SurfaceEvent::Click { surface, anchor } => {
                if !self.is_active(surface) {
                    return Disposition::Default;
                }
                match anchor {
                    Some(anchor) => {
                        self.on_anchor_click(&anchor);
                        Disposition::Prevented
                    }
                    None => Disposition::Default,
                }
            }
            SurfaceEvent::Scroll {
                surface,
                scroll_top,
                client_height,
            } => {
                if self.is_active(surface) {
                    self.scroll.on_scroll(scroll_top, client_height);
                }
                Disposition::Default
            }
            SurfaceEvent::Message { surface, message } => {
                if self.is_active(surface) {
                    self.on_content_message(message);
                } else {
                    debug!(session = %self.id, surface = %surface, command = %message.command, "message from inactive surface ignored");
                }
                Disposition::Default
            }
        }
    }

    fn is_active(&self, surface: SurfaceId) -> bool {
        self.active_id() == Some(surface)
    }

    fn on_navigation_blocked(&mut self, surface: SurfaceId, url: &str) {
        if !self.is_active(surface) && self.pending_id() != Some(surface) {
            return;
        }
        if self.development_mode {
            debug!(session = %self.id, surface = %surface, url = %url, "navigation in development mode, requesting reload");
            self.emit(BridgeMessage::DoReload);
        } else {
            info!(session = %self.id, surface = %surface, url = %url, "prevented webview navigation");
        }
    }

    fn on_anchor_click(&mut self, anchor: &Anchor) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let base = active.document.document.base_href().map(str::to_string);
        let result = match anchor.classify(base.as_deref()) {
            LinkAction::ScrollToTop => active.surface.scroll_to_top(),
            LinkAction::ScrollToFragment(fragment) => active.surface.scroll_into_view(&fragment),
            LinkAction::OpenExternal(href) => {
                debug!(session = %self.id, href = %href, "link click forwarded to host");
                self.outbox.push(BridgeMessage::DidClickLink(href));
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(session = %self.id, error = %e, "failed to scroll surface");
        }
    }

    fn on_content_message(&mut self, message: ContentMessage) {
        let forwarded = self.relay.receive(message);
        self.emit(forwarded);
    }

    /// Resize every live surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        for slot in [self.active.as_mut(), self.pending.as_mut()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = slot.surface.resize(width, height) {
                warn!(surface = %slot.id(), error = %e, "failed to resize surface");
            }
        }
    }
}
