use std::time::{Duration, Instant};

use crate::inject::InjectedDocument;
use crate::protocol::ThemeData;
use crate::surface::{Surface, SurfaceId};

/// Default delay before a pending surface is promoted without a load signal.
pub const DEFAULT_PROMOTION_DELAY: Duration = Duration::from_millis(200);

/// Which surfaces currently exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    Empty,
    PendingOnly,
    ActiveOnly,
    ActivePending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Pending,
    Active,
}

/// A surface plus the document that was written into it.
pub struct FrameSlot<S> {
    pub role: SlotRole,
    pub surface: S,
    pub document: InjectedDocument,
}

impl<S: Surface> FrameSlot<S> {
    pub(super) fn pending(surface: S, document: InjectedDocument) -> Self {
        Self {
            role: SlotRole::Pending,
            surface,
            document,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.surface.id()
    }
}

/// Armed promotion timer, keyed by the surface it would promote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct PromotionTimer {
    pub surface: SurfaceId,
    pub deadline: Instant,
}

/// Session tunables.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub promotion_delay: Duration,
    /// Blocked navigations turn into `do-reload` when set.
    pub development_mode: bool,
    /// Theme used until the host sends `styles`.
    pub theme: ThemeData,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            promotion_delay: DEFAULT_PROMOTION_DELAY,
            development_mode: false,
            theme: ThemeData::default(),
        }
    }
}
