//! Shared types for the Sandframe workspace: error enums and identifiers.

pub mod errors;
pub mod id;

pub use errors::{ConfigError, ProtocolError, SandframeError, SurfaceError};
pub use id::{new_id, SessionId};

pub type Result<T> = std::result::Result<T, SandframeError>;
