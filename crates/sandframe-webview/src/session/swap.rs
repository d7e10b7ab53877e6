//! Content update and promotion: the double-buffered swap.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::protocol::{BridgeMessage, ContentUpdateRequest};
use crate::surface::{ScrollRestore, Surface, SurfaceBackend, SurfaceId, SurfaceSpec};

use super::types::{FrameSlot, PromotionTimer, SlotRole};
use super::BridgeSession;

impl<B: SurfaceBackend> BridgeSession<B> {
    /// Replace the rendered content. The latest request always wins: any
    /// pending surface, its promotion race and its queued messages go away.
    pub fn update_content(&mut self, request: ContentUpdateRequest, now: Instant) {
        self.promotion = None;
        if let Some(stale) = self.pending.take() {
            debug!(session = %self.id, surface = %stale.id(), "discarding superseded pending surface");
        }
        if !self.relay.is_empty() {
            debug!(
                session = %self.id,
                dropped = self.relay.len(),
                "discarding messages queued for superseded content"
            );
            self.relay.clear();
        }

        let document = self
            .injector
            .build(&request, &self.theme, self.base_url.as_deref());
        let id = self.allocate_surface_id();
        let spec = SurfaceSpec::hidden(document.sandbox);

        let mut surface = match self.backend.create_surface(id, &spec) {
            Ok(surface) => surface,
            Err(e) => {
                error!(session = %self.id, surface = %id, error = %e, "failed to create surface");
                return;
            }
        };
        if let Err(e) = surface.write_document(&document) {
            error!(session = %self.id, surface = %id, error = %e, "failed to write document");
            return;
        }

        debug!(
            session = %self.id,
            surface = %id,
            sandbox = %document.sandbox.to_attribute(),
            bytes = document.html.len(),
            "pending surface created"
        );
        self.pending = Some(FrameSlot::pending(surface, document));
        self.promotion = Some(PromotionTimer {
            surface: id,
            deadline: now + self.promotion_delay,
        });
    }

    /// Fire the promotion timer if its deadline has passed.
    pub fn poll_timers(&mut self, now: Instant) {
        let Some(timer) = self.promotion else {
            return;
        };
        if now < timer.deadline {
            return;
        }
        self.promotion = None;
        debug!(session = %self.id, surface = %timer.surface, "promotion timer fired");
        self.promote(timer.surface);
    }

    /// The surface reported load completion.
    pub(super) fn on_loaded(&mut self, id: SurfaceId) {
        match self.promotion {
            Some(timer) if timer.surface == id => {
                self.promotion = None;
                debug!(session = %self.id, surface = %id, "surface loaded before timeout");
                self.promote(id);
            }
            _ => {
                debug!(session = %self.id, surface = %id, "load signal ignored");
            }
        }
    }

    /// Swap the pending surface in as the active one.
    fn promote(&mut self, id: SurfaceId) {
        if self.pending_id() != Some(id) {
            return;
        }
        let Some(mut slot) = self.pending.take() else {
            return;
        };

        let restore = if self.first_promotion_done {
            self.active
                .as_ref()
                .map(|old| ScrollRestore::Offset(old.surface.scroll_top()))
        } else {
            self.first_promotion_done = true;
            self.initial_scroll_progress
                .filter(|p| p.is_finite())
                .map(ScrollRestore::Progress)
        };
        if let Some(restore) = restore {
            if let Err(e) = slot.surface.restore_scroll(restore) {
                warn!(session = %self.id, surface = %id, error = %e, "failed to restore scroll");
            }
        }

        if let Some(old) = self.active.take() {
            debug!(session = %self.id, surface = %old.id(), "destroying previous active surface");
        }
        self.scroll.reset();

        if let Err(e) = slot.surface.set_visible(true) {
            warn!(session = %self.id, surface = %id, error = %e, "failed to show surface");
        }
        slot.role = SlotRole::Active;

        for payload in self.relay.drain() {
            if let Err(e) = slot.surface.post_message(&payload) {
                warn!(session = %self.id, surface = %id, error = %e, "failed to deliver queued message");
            }
        }

        self.active = Some(slot);
        info!(session = %self.id, surface = %id, "surface promoted");
        self.emit(BridgeMessage::DidSetContent);
    }
}
