//! Rendering surface abstraction.
//!
//! A surface is one isolated child view holding one document. Backends
//! create surfaces; the session decides which one is visible.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sandframe_common::SurfaceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::CapabilityTransport;
use crate::inject::InjectedDocument;
use crate::protocol::{ContentOptions, ThemeData};

/// Per-session, monotonically increasing surface identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// SANDBOX
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxPolicy {
    pub allow_scripts: bool,
    pub allow_forms: bool,
    pub allow_same_origin: bool,
}

impl SandboxPolicy {
    pub fn from_options(options: &ContentOptions) -> Self {
        Self {
            allow_scripts: options.allow_scripts,
            allow_forms: options.allow_scripts,
            allow_same_origin: true,
        }
    }

    /// Rendered as an iframe `sandbox` attribute.
    pub fn to_attribute(&self) -> String {
        let mut tokens = Vec::new();
        if self.allow_scripts {
            tokens.push("allow-scripts");
        }
        if self.allow_forms {
            tokens.push("allow-forms");
        }
        if self.allow_same_origin {
            tokens.push("allow-same-origin");
        }
        tokens.join(" ")
    }

    /// CSP equivalent for backends without iframe sandboxing.
    /// `None` when nothing needs to be restricted.
    pub fn content_security_policy(&self) -> Option<String> {
        let mut directives = Vec::new();
        if !self.allow_scripts {
            directives.push("script-src 'none'");
        }
        if !self.allow_forms {
            directives.push("form-action 'none'");
        }
        (!directives.is_empty()).then(|| directives.join("; "))
    }
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self::from_options(&ContentOptions::default())
    }
}

/// Parameters for a new surface. Surfaces always start hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSpec {
    pub sandbox: SandboxPolicy,
    pub visible: bool,
}

impl SurfaceSpec {
    pub fn hidden(sandbox: SandboxPolicy) -> Self {
        Self {
            sandbox,
            visible: false,
        }
    }
}

/// How to restore scroll on promotion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollRestore {
    /// Fraction of the surface's client height.
    Progress(f64),
    /// Absolute offset in pixels.
    Offset(f64),
}

// =============================================================================
// LOAD GATE
// =============================================================================

/// Numbers each document write to a surface. A load completion counts only
/// if it belongs to the latest write; completions of superseded documents
/// are stale.
///
/// Clones share the counter, so load callbacks can hold one.
#[derive(Debug, Clone, Default)]
pub struct LoadGate {
    latest: Arc<AtomicU64>,
}

impl LoadGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new document write and return its generation.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a load of `generation` is for the latest write.
    pub fn is_current(&self, generation: u64) -> bool {
        generation != 0 && self.latest.load(Ordering::SeqCst) == generation
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// One live rendering surface. Dropping it destroys it.
pub trait Surface {
    fn id(&self) -> SurfaceId;

    /// Replace the surface's document.
    fn write_document(&mut self, document: &InjectedDocument) -> Result<(), SurfaceError>;

    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError>;

    /// Last known vertical scroll offset.
    fn scroll_top(&self) -> f64;

    /// Apply `restore` only if the surface is still scrolled to the top.
    fn restore_scroll(&mut self, restore: ScrollRestore) -> Result<(), SurfaceError>;

    fn scroll_to_top(&mut self) -> Result<(), SurfaceError>;

    /// Scroll the element with `element_id` into view, if it exists.
    fn scroll_into_view(&mut self, element_id: &str) -> Result<(), SurfaceError>;

    /// Deliver a host payload to the content's message listeners.
    fn post_message(&mut self, payload: &Value) -> Result<(), SurfaceError>;

    fn focus(&mut self) -> Result<(), SurfaceError>;

    /// Update theme variables and body class on the live document.
    fn apply_theme(&mut self, theme: &ThemeData) -> Result<(), SurfaceError>;

    /// Resize to the given logical size.
    fn resize(&mut self, _width: u32, _height: u32) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Factory for surfaces of one kind.
pub trait SurfaceBackend {
    type Surface: Surface;

    fn create_surface(
        &mut self,
        id: SurfaceId,
        spec: &SurfaceSpec,
    ) -> Result<Self::Surface, SurfaceError>;

    /// How injected capability scripts reach the bridge on this backend.
    fn capability_transport(&self) -> CapabilityTransport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_with_scripts() {
        let policy = SandboxPolicy::from_options(&ContentOptions {
            allow_scripts: true,
            enable_wrapped_post_message: false,
        });
        assert_eq!(
            policy.to_attribute(),
            "allow-scripts allow-forms allow-same-origin"
        );
        assert_eq!(policy.content_security_policy(), None);
    }

    #[test]
    fn sandbox_without_scripts() {
        let policy = SandboxPolicy::default();
        assert_eq!(policy.to_attribute(), "allow-same-origin");
        assert_eq!(
            policy.content_security_policy().as_deref(),
            Some("script-src 'none'; form-action 'none'")
        );
    }

    #[test]
    fn load_gate_only_accepts_latest_write() {
        let gate = LoadGate::new();
        assert!(!gate.is_current(0));
        let first = gate.begin();
        assert!(gate.is_current(first));

        let shared = gate.clone();
        let second = shared.begin();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }

    #[test]
    fn surface_id_display() {
        assert_eq!(SurfaceId(7).to_string(), "7");
        assert!(SurfaceId(1) < SurfaceId(2));
    }
}
