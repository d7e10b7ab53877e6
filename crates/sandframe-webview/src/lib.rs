//! Sandboxed content bridge.
//!
//! Renders untrusted HTML inside isolated surfaces on behalf of a privileged
//! host:
//! - Double-buffered content swap (pending → active) without flicker
//! - Message queueing until content is ready, relay in both directions
//! - Link click and navigation interception
//! - Injection of default styles and a one-time-acquirable host API

pub mod backend;
pub mod capability;
pub mod dom;
pub mod events;
pub mod inject;
pub mod links;
pub mod protocol;
pub mod relay;
pub mod scroll;
pub mod session;
pub mod surface;

pub use backend::{HeadlessBackend, HeadlessSurface, WryBackend, WrySurface};
pub use capability::{CapabilityError, CapabilityGrant, CapabilityTransport, ContentApi};
pub use events::{Disposition, SurfaceEvent};
pub use inject::{ContentInjector, InjectedDocument};
pub use protocol::{
    BridgeMessage, ContentMessage, ContentOptions, ContentUpdateRequest, HostMessage, ThemeData,
    WireMessage,
};
pub use session::{BridgeSession, SessionOptions, SwapState};
pub use surface::{LoadGate, SandboxPolicy, Surface, SurfaceBackend, SurfaceId};
