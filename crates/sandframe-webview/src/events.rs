//! Events reported by surfaces.

use crate::links::Anchor;
use crate::protocol::ContentMessage;
use crate::surface::SurfaceId;

/// Something happened inside a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The written document finished loading.
    Loaded { surface: SurfaceId },
    /// The document tried to navigate away; the backend blocked it.
    NavigationBlocked { surface: SurfaceId, url: String },
    /// A click; `anchor` is the nearest enclosing `<a href>`, if any.
    Click {
        surface: SurfaceId,
        anchor: Option<Anchor>,
    },
    Scroll {
        surface: SurfaceId,
        scroll_top: f64,
        client_height: f64,
    },
    /// A message posted through the capability object.
    Message {
        surface: SurfaceId,
        message: ContentMessage,
    },
}

/// Whether the surface should run its default action for the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Default,
    /// The default action (navigation) is suppressed.
    Prevented,
}
