//! Host ⇄ bridge ⇄ content message protocol.
//!
//! Every message crossing the host boundary travels in a [`WireMessage`]
//! envelope: `{"channel": "<name>", "args": [...]}`. Inbound envelopes are
//! validated into the closed [`HostMessage`] enum before dispatch; outbound
//! [`BridgeMessage`]s are lowered back into envelopes.
//!
//! Content talks to the bridge with [`ContentMessage`]s
//! (`{command, data}`), produced by the capability object.

use std::collections::BTreeMap;

use sandframe_common::{ProtocolError, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command tag used by the capability object's `postMessage`.
pub const COMMAND_POST_MESSAGE: &str = "onmessage";
/// Command tag used by the capability object's `setState`.
pub const COMMAND_UPDATE_STATE: &str = "do-update-state";

// =============================================================================
// ENVELOPE
// =============================================================================

/// Transport envelope shared by both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub channel: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl WireMessage {
    pub fn new(channel: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            channel: channel.into(),
            args,
        }
    }

    /// Parse an envelope from a raw JSON line.
    pub fn from_json(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"channel\":\"invalid\"}".to_string())
    }
}

// =============================================================================
// DATA MODEL
// =============================================================================

/// Per-request rendering options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentOptions {
    pub allow_scripts: bool,
    pub enable_wrapped_post_message: bool,
}

/// A request to replace the rendered content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUpdateRequest {
    #[serde(rename = "contents")]
    pub html: String,
    #[serde(default)]
    pub options: ContentOptions,
    /// Opaque state previously reported through `do-update-state`.
    #[serde(default, rename = "state", skip_serializing_if = "Option::is_none")]
    pub persisted_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ContentUpdateRequest {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            options: ContentOptions::default(),
            persisted_state: None,
            base_url: None,
        }
    }

    pub fn with_options(mut self, options: ContentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.persisted_state = Some(state.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Theme variables plus the body class of the active theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeData {
    /// CSS custom properties, without the leading `--`.
    pub variables: BTreeMap<String, String>,
    pub active_theme: String,
}

impl ThemeData {
    pub fn new(variables: BTreeMap<String, String>, active_theme: impl Into<String>) -> Self {
        Self {
            variables,
            active_theme: active_theme.into(),
        }
    }
}

// =============================================================================
// HOST -> BRIDGE
// =============================================================================

/// Validated message from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    BaseUrl(String),
    Styles(ThemeData),
    Focus,
    Content(ContentUpdateRequest),
    Message(Value),
    InitialScrollPosition(f64),
    DevtoolsOpened,
}

impl HostMessage {
    /// Parse and validate a raw JSON envelope.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        Self::try_from(WireMessage::from_json(raw)?)
    }

    pub fn channel(&self) -> &'static str {
        match self {
            Self::BaseUrl(_) => "baseUrl",
            Self::Styles(_) => "styles",
            Self::Focus => "focus",
            Self::Content(_) => "content",
            Self::Message(_) => "message",
            Self::InitialScrollPosition(_) => "initial-scroll-position",
            Self::DevtoolsOpened => "devtools-opened",
        }
    }

    /// Lower into an envelope (what a host would send).
    pub fn to_wire(&self) -> WireMessage {
        let args = match self {
            Self::BaseUrl(url) => vec![Value::from(url.as_str())],
            Self::Styles(theme) => vec![
                serde_json::to_value(&theme.variables).unwrap_or(Value::Null),
                Value::from(theme.active_theme.as_str()),
            ],
            Self::Content(req) => vec![serde_json::to_value(req).unwrap_or(Value::Null)],
            Self::Message(payload) => vec![payload.clone()],
            Self::InitialScrollPosition(progress) => vec![Value::from(*progress)],
            Self::Focus | Self::DevtoolsOpened => Vec::new(),
        };
        WireMessage::new(self.channel(), args)
    }
}

impl TryFrom<WireMessage> for HostMessage {
    type Error = ProtocolError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let WireMessage { channel, args } = wire;
        let mut args = args.into_iter();

        let invalid = |expected: &'static str| ProtocolError::InvalidArgs {
            channel: channel.clone(),
            expected,
        };

        match channel.as_str() {
            "baseUrl" => match args.next() {
                Some(Value::String(url)) => Ok(Self::BaseUrl(url)),
                _ => Err(invalid("(url: string)")),
            },
            "styles" => {
                let variables = args
                    .next()
                    .and_then(|v| serde_json::from_value::<BTreeMap<String, String>>(v).ok())
                    .ok_or_else(|| invalid("(variables: {string: string}, themeName: string)"))?;
                let active_theme = match args.next() {
                    Some(Value::String(name)) => name,
                    _ => return Err(invalid("(variables: {string: string}, themeName: string)")),
                };
                Ok(Self::Styles(ThemeData {
                    variables,
                    active_theme,
                }))
            }
            "focus" => Ok(Self::Focus),
            "content" => args
                .next()
                .and_then(|v| serde_json::from_value::<ContentUpdateRequest>(v).ok())
                .map(Self::Content)
                .ok_or_else(|| invalid("({contents, options, state?, baseUrl?})")),
            "message" => Ok(Self::Message(args.next().unwrap_or(Value::Null))),
            "initial-scroll-position" => args
                .next()
                .and_then(|v| v.as_f64())
                .map(Self::InitialScrollPosition)
                .ok_or_else(|| invalid("(progress: number)")),
            "devtools-opened" => Ok(Self::DevtoolsOpened),
            _ => Err(ProtocolError::UnknownChannel(channel.clone())),
        }
    }
}

// =============================================================================
// CONTENT -> BRIDGE
// =============================================================================

/// A message posted by content through its capability object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMessage {
    pub command: String,
    #[serde(default)]
    pub data: Value,
}

impl ContentMessage {
    pub fn new(command: impl Into<String>, data: Value) -> Self {
        Self {
            command: command.into(),
            data,
        }
    }

    /// Parse from a raw JSON string; `None` if it is not `{command, data}`.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

// =============================================================================
// BRIDGE -> HOST
// =============================================================================

/// Message emitted by the bridge towards the host.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeMessage {
    DidClickLink(String),
    DidScroll(f64),
    DidSetContent,
    DoReload,
    /// Content message passed through, tagged with its declared command.
    Relay(ContentMessage),
    WebviewReady(SessionId),
}

impl BridgeMessage {
    pub fn channel(&self) -> &str {
        match self {
            Self::DidClickLink(_) => "did-click-link",
            Self::DidScroll(_) => "did-scroll",
            Self::DidSetContent => "did-set-content",
            Self::DoReload => "do-reload",
            Self::Relay(msg) => &msg.command,
            Self::WebviewReady(_) => "webview-ready",
        }
    }

    pub fn to_wire(&self) -> WireMessage {
        let args = match self {
            Self::DidClickLink(href) => vec![Value::from(href.as_str())],
            Self::DidScroll(progress) => vec![Value::from(*progress)],
            Self::DidSetContent | Self::DoReload => Vec::new(),
            Self::Relay(msg) => vec![msg.data.clone()],
            Self::WebviewReady(id) => vec![Value::from(id.as_str())],
        };
        WireMessage::new(self.channel(), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_content_message_with_all_fields() {
        let raw = r#"{"channel":"content","args":[{
            "contents":"<p>hi</p>",
            "options":{"allowScripts":true,"enableWrappedPostMessage":true},
            "state":"{\"n\":1}",
            "baseUrl":"https://example.test/"
        }]}"#;
        let HostMessage::Content(req) = HostMessage::parse(raw).unwrap() else {
            panic!("expected content");
        };
        assert_eq!(req.html, "<p>hi</p>");
        assert!(req.options.allow_scripts);
        assert!(req.options.enable_wrapped_post_message);
        assert_eq!(req.persisted_state.as_deref(), Some("{\"n\":1}"));
        assert_eq!(req.base_url.as_deref(), Some("https://example.test/"));
    }

    #[test]
    fn parse_content_defaults_options() {
        let raw = r#"{"channel":"content","args":[{"contents":"x"}]}"#;
        let HostMessage::Content(req) = HostMessage::parse(raw).unwrap() else {
            panic!("expected content");
        };
        assert_eq!(req.options, ContentOptions::default());
        assert!(req.persisted_state.is_none());
    }

    #[test]
    fn parse_styles() {
        let raw = r##"{"channel":"styles","args":[{"color":"#fff"},"theme-light"]}"##;
        let msg = HostMessage::parse(raw).unwrap();
        let HostMessage::Styles(theme) = msg else {
            panic!("expected styles");
        };
        assert_eq!(theme.active_theme, "theme-light");
        assert_eq!(theme.variables["color"], "#fff");
    }

    #[test]
    fn parse_styles_missing_theme_is_invalid() {
        let raw = r#"{"channel":"styles","args":[{}]}"#;
        assert!(matches!(
            HostMessage::parse(raw),
            Err(ProtocolError::InvalidArgs { .. })
        ));
    }

    #[test]
    fn parse_argless_channels() {
        assert_eq!(
            HostMessage::parse(r#"{"channel":"focus"}"#).unwrap(),
            HostMessage::Focus
        );
        assert_eq!(
            HostMessage::parse(r#"{"channel":"devtools-opened","args":[]}"#).unwrap(),
            HostMessage::DevtoolsOpened
        );
    }

    #[test]
    fn parse_initial_scroll_position() {
        let msg = HostMessage::parse(r#"{"channel":"initial-scroll-position","args":[0.25]}"#)
            .unwrap();
        assert_eq!(msg, HostMessage::InitialScrollPosition(0.25));
        assert!(HostMessage::parse(r#"{"channel":"initial-scroll-position","args":["x"]}"#)
            .is_err());
    }

    #[test]
    fn parse_message_passes_payload_through() {
        let msg = HostMessage::parse(r#"{"channel":"message","args":[{"a":[1,2]}]}"#).unwrap();
        assert_eq!(msg, HostMessage::Message(json!({"a": [1, 2]})));
    }

    #[test]
    fn unknown_channel_rejected() {
        assert!(matches!(
            HostMessage::parse(r#"{"channel":"eval","args":["1"]}"#),
            Err(ProtocolError::UnknownChannel(c)) if c == "eval"
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            HostMessage::parse("not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn host_message_wire_form_parses_back() {
        let msg = HostMessage::Content(
            ContentUpdateRequest::new("<p>x</p>")
                .with_state("{}")
                .with_base_url("https://b.test/"),
        );
        let raw = msg.to_wire().to_json();
        assert_eq!(HostMessage::parse(&raw).unwrap(), msg);
    }

    #[test]
    fn bridge_messages_lower_to_channels() {
        assert_eq!(
            BridgeMessage::DidClickLink("https://x.test/".into()).to_wire(),
            WireMessage::new("did-click-link", vec![json!("https://x.test/")])
        );
        assert_eq!(
            BridgeMessage::DidScroll(0.5).to_wire(),
            WireMessage::new("did-scroll", vec![json!(0.5)])
        );
        assert_eq!(
            BridgeMessage::DidSetContent.to_wire().to_json(),
            r#"{"channel":"did-set-content"}"#
        );
        assert_eq!(BridgeMessage::DoReload.channel(), "do-reload");
    }

    #[test]
    fn relay_is_tagged_with_content_command() {
        let msg = BridgeMessage::Relay(ContentMessage::new(
            COMMAND_UPDATE_STATE,
            json!("{\"n\":2}"),
        ));
        let wire = msg.to_wire();
        assert_eq!(wire.channel, "do-update-state");
        assert_eq!(wire.args, vec![json!("{\"n\":2}")]);
    }

    #[test]
    fn webview_ready_carries_session_id() {
        let id = SessionId::new();
        let wire = BridgeMessage::WebviewReady(id.clone()).to_wire();
        assert_eq!(wire.channel, "webview-ready");
        assert_eq!(wire.args, vec![json!(id.as_str())]);
    }

    #[test]
    fn content_message_from_json() {
        let msg = ContentMessage::from_json(r#"{"command":"onmessage","data":{"k":1}}"#).unwrap();
        assert_eq!(msg.command, COMMAND_POST_MESSAGE);
        assert_eq!(msg.data, json!({"k": 1}));
        assert!(ContentMessage::from_json(r#"{"data":1}"#).is_none());
    }
}
