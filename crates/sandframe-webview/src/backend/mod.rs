//! Surface backends.
//!
//! - [`HeadlessBackend`]: in-memory surfaces, no rendering engine.
//! - [`WryBackend`]: one native child webview per surface.

pub mod headless;
pub mod webview;

pub use headless::{HeadlessBackend, HeadlessSurface};
pub use webview::{WryBackend, WrySurface};
