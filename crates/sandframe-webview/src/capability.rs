//! One-time-acquirable host API handed to content.
//!
//! Two renditions share the same contract:
//! - [`capability_script`] renders the `acquireHostApi()` script injected into
//!   documents rendered by a real browser engine;
//! - [`CapabilityGrant`] is the in-process equivalent used by backends that
//!   run content natively (the headless backend).
//!
//! Either way the API may be acquired once per document. It exposes
//! `postMessage`, `setState` and `getState`, where the state is the persisted
//! value parsed once when the document was built.

use serde_json::Value;
use thiserror::Error;

use crate::protocol::{ContentMessage, COMMAND_POST_MESSAGE, COMMAND_UPDATE_STATE};

/// Name of the acquisition function exposed to content.
pub const ACQUIRE_FUNCTION: &str = "acquireHostApi";

/// Error thrown by a second acquisition.
pub const ALREADY_ACQUIRED_MESSAGE: &str = "An instance of the host API has already been acquired";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("{msg}", msg = ALREADY_ACQUIRED_MESSAGE)]
    AlreadyAcquired,
}

/// How the injected script reaches the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityTransport {
    /// `window.parent.postMessage(msg, '*')`, for iframe hosting.
    #[default]
    ParentWindow,
    /// `window.ipc.postMessage(...)`, for native webviews. `window.ipc` is
    /// deleted along with the parent references.
    NativeIpc,
}

impl CapabilityTransport {
    fn binding(self) -> &'static str {
        match self {
            Self::ParentWindow => {
                "const target = window.parent;\n\
                 \x20       const send = function(msg) { return target.postMessage(msg, '*'); };"
            }
            Self::NativeIpc => {
                "const target = window.ipc;\n\
                 \x20       const send = function(msg) { return target.postMessage(JSON.stringify({ kind: 'message', message: msg })); };"
            }
        }
    }

    fn extra_deletes(self) -> &'static str {
        match self {
            Self::ParentWindow => "",
            Self::NativeIpc => "\ndelete window.ipc;",
        }
    }
}

// =============================================================================
// SCRIPT
// =============================================================================

const SCRIPT_TEMPLATE: &str = r#"
const acquireHostApi = (function() {
    __TRANSPORT__
    let acquired = false;
    let state;
    try {
        state = JSON.parse(__STATE__);
    } catch (e) {
        state = undefined;
    }

    return () => {
        if (acquired) {
            throw new Error('__ERROR__');
        }
        acquired = true;
        return Object.freeze({
            postMessage: function(msg) {
                return send({ command: '__POST__', data: msg });
            },
            setState: function(newState) {
                return send({ command: '__UPDATE__', data: JSON.stringify(newState) });
            },
            getState: function() {
                return state;
            }
        });
    };
})();
delete window.parent;
delete window.top;
delete window.frameElement;__EXTRA_DELETES__
"#;

/// JS string literal for the persisted state, or `undefined` when absent.
///
/// `<` is escaped so the literal can never close the enclosing `<script>`;
/// U+2028/U+2029 are escaped for engines that treat them as line breaks.
pub fn state_literal(state: Option<&str>) -> String {
    match state {
        Some(state) => serde_json::to_string(state)
            .unwrap_or_else(|_| "undefined".to_string())
            .replace('<', "\\u003c")
            .replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029"),
        None => "undefined".to_string(),
    }
}

/// Render the capability script for a document.
pub fn capability_script(state: Option<&str>, transport: CapabilityTransport) -> String {
    // State is content-controlled: it must be substituted last so no later
    // pass rescans it for placeholders.
    SCRIPT_TEMPLATE
        .replace("__TRANSPORT__", transport.binding())
        .replace("__ERROR__", ALREADY_ACQUIRED_MESSAGE)
        .replace("__POST__", COMMAND_POST_MESSAGE)
        .replace("__UPDATE__", COMMAND_UPDATE_STATE)
        .replace("__EXTRA_DELETES__", transport.extra_deletes())
        .replace("__STATE__", &state_literal(state))
}

// =============================================================================
// NATIVE GRANT
// =============================================================================

/// Per-document acquisition guard for natively hosted content.
#[derive(Debug, Clone, Default)]
pub struct CapabilityGrant {
    state: Option<Value>,
    acquired: bool,
}

impl CapabilityGrant {
    /// Build a grant from the raw persisted state. Unparsable state reads back
    /// as absent.
    pub fn new(persisted_state: Option<&str>) -> Self {
        Self {
            state: persisted_state.and_then(|s| serde_json::from_str(s).ok()),
            acquired: false,
        }
    }

    pub fn acquire(&mut self) -> Result<ContentApi, CapabilityError> {
        if self.acquired {
            return Err(CapabilityError::AlreadyAcquired);
        }
        self.acquired = true;
        Ok(ContentApi {
            state: self.state.clone(),
        })
    }
}

/// The acquired API. Its methods build the messages content would post.
#[derive(Debug, Clone)]
pub struct ContentApi {
    state: Option<Value>,
}

impl ContentApi {
    pub fn post_message(&self, payload: Value) -> ContentMessage {
        ContentMessage::new(COMMAND_POST_MESSAGE, payload)
    }

    pub fn set_state(&self, state: &Value) -> ContentMessage {
        ContentMessage::new(COMMAND_UPDATE_STATE, Value::String(state.to_string()))
    }

    pub fn get_state(&self) -> Option<&Value> {
        self.state.as_ref()
    }
}
