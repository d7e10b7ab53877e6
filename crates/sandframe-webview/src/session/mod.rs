//! Bridge session: one host connection, up to two surfaces.
//!
//! `BridgeSession` owns the active and pending frame slots and drives the
//! double-buffered swap. It is a plain value mutated through `&mut self`;
//! the driver feeds it host messages, surface events, timer polls and
//! animation frames, then drains the messages it produced for the host.

use std::time::{Duration, Instant};

use sandframe_common::SessionId;
use tracing::info;

use crate::inject::ContentInjector;
use crate::protocol::{BridgeMessage, ThemeData};
use crate::relay::MessageRelay;
use crate::scroll::ScrollStateTracker;
use crate::surface::{SurfaceBackend, SurfaceId};

mod handlers;
mod swap;
mod types;


pub use types::{FrameSlot, SessionOptions, SlotRole, SwapState, DEFAULT_PROMOTION_DELAY};

use types::PromotionTimer;

pub struct BridgeSession<B: SurfaceBackend> {
    id: SessionId,
    backend: B,
    injector: ContentInjector,
    promotion_delay: Duration,
    development_mode: bool,
    theme: ThemeData,
    base_url: Option<String>,
    initial_scroll_progress: Option<f64>,
    first_promotion_done: bool,
    next_surface_id: u64,
    active: Option<FrameSlot<B::Surface>>,
    pending: Option<FrameSlot<B::Surface>>,
    promotion: Option<PromotionTimer>,
    relay: MessageRelay,
    scroll: ScrollStateTracker,
    outbox: Vec<BridgeMessage>,
}

impl<B: SurfaceBackend> BridgeSession<B> {
    pub fn new(backend: B, options: SessionOptions) -> Self {
        let injector = ContentInjector::new(backend.capability_transport());
        Self {
            id: SessionId::new(),
            backend,
            injector,
            promotion_delay: options.promotion_delay,
            development_mode: options.development_mode,
            theme: options.theme,
            base_url: None,
            initial_scroll_progress: None,
            first_promotion_done: false,
            next_surface_id: 1,
            active: None,
            pending: None,
            promotion: None,
            relay: MessageRelay::new(),
            scroll: ScrollStateTracker::new(),
            outbox: Vec::new(),
        }
    }

    /// Announce the session to the host.
    pub fn start(&mut self) {
        info!(session = %self.id, "bridge session ready");
        self.emit(BridgeMessage::WebviewReady(self.id.clone()));
    }

    /// Take every message produced for the host since the last call.
    pub fn drain_outbox(&mut self) -> Vec<BridgeMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn state(&self) -> SwapState {
        match (self.active.is_some(), self.pending.is_some()) {
            (false, false) => SwapState::Empty,
            (false, true) => SwapState::PendingOnly,
            (true, false) => SwapState::ActiveOnly,
            (true, true) => SwapState::ActivePending,
        }
    }

    /// When the driver must call [`poll_timers`](Self::poll_timers) next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.promotion.map(|t| t.deadline)
    }

    /// Whether a scroll notification waits for the next frame.
    pub fn wants_animation_frame(&self) -> bool {
        self.scroll.is_scheduled()
    }

    /// The frame fired: flush the coalesced scroll notification.
    pub fn animation_frame(&mut self) {
        if let Some(progress) = self.scroll.on_animation_frame() {
            self.emit(BridgeMessage::DidScroll(progress));
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn theme(&self) -> &ThemeData {
        &self.theme
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn is_development_mode(&self) -> bool {
        self.development_mode
    }

    pub fn active(&self) -> Option<&FrameSlot<B::Surface>> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut FrameSlot<B::Surface>> {
        self.active.as_mut()
    }

    pub fn pending(&self) -> Option<&FrameSlot<B::Surface>> {
        self.pending.as_ref()
    }

    pub fn pending_mut(&mut self) -> Option<&mut FrameSlot<B::Surface>> {
        self.pending.as_mut()
    }

    pub fn active_id(&self) -> Option<SurfaceId> {
        self.active.as_ref().map(FrameSlot::id)
    }

    pub fn pending_id(&self) -> Option<SurfaceId> {
        self.pending.as_ref().map(FrameSlot::id)
    }

    /// Number of payloads waiting for the pending surface.
    pub fn queued_messages(&self) -> usize {
        self.relay.len()
    }

    fn emit(&mut self, message: BridgeMessage) {
        self.outbox.push(message);
    }

    fn allocate_surface_id(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next_surface_id);
        self.next_surface_id += 1;
        id
    }
}
