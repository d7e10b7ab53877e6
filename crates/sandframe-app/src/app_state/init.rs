//! Window creation and session setup.

use std::sync::Arc;
use std::time::Instant;

use sandframe_webview::{BridgeSession, WryBackend};
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowAttributes;

use super::core::SandframeApp;

impl SandframeApp {
    /// Create the window and the bridge session bound to it.
    /// Returns `false` if initialization failed and the event loop should exit.
    pub(super) fn initialize_window(&mut self, event_loop: &ActiveEventLoop) -> bool {
        let cfg = &self.config.window;
        let attrs = WindowAttributes::default()
            .with_title(cfg.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                f64::from(cfg.width),
                f64::from(cfg.height),
            ));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!("Failed to create window: {e}");
                return false;
            }
        };

        let backend = WryBackend::new(Arc::clone(&window), cfg.width, cfg.height)
            .with_devtools(self.config.development.devtools || self.options.development_mode);
        let mut session = BridgeSession::new(backend, self.options.clone());
        session.start();

        let now = Instant::now();
        for message in self.backlog.drain(..) {
            session.handle_host_message(message, now);
        }

        tracing::info!(session = %session.id(), "window ready");
        self.window = Some(window);
        self.session = Some(session);
        self.flush_outbox();
        true
    }
}
