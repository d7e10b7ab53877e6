//! SandframeApp struct definition and constructor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sandframe_config::SandframeConfig;
use sandframe_webview::{BridgeSession, HostMessage, SessionOptions, WryBackend};
use winit::window::Window;

pub(super) type WindowSession = BridgeSession<WryBackend<Window>>;

/// Top-level windowed application state.
pub struct SandframeApp {
    pub(super) config: SandframeConfig,
    pub(super) options: SessionOptions,
    pub(super) frame_interval: Duration,

    // Windowing
    pub(super) window: Option<Arc<Window>>,
    pub(super) session: Option<WindowSession>,

    /// Host messages received before the window existed.
    pub(super) backlog: Vec<HostMessage>,

    pub(super) last_frame: Instant,
}

impl SandframeApp {
    pub fn new(config: SandframeConfig, options: SessionOptions) -> Self {
        let frame_interval = config.scroll.frame_interval();
        Self {
            config,
            options,
            frame_interval,
            window: None,
            session: None,
            backlog: Vec::new(),
            last_frame: Instant::now(),
        }
    }
}
