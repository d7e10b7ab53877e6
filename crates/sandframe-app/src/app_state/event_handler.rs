//! `ApplicationHandler` implementation for the winit event loop.

use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

use super::core::SandframeApp;
use super::AppEvent;

impl ApplicationHandler<AppEvent> for SandframeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if !self.initialize_window(event_loop) {
            event_loop.exit();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Host(message) => match self.session.as_mut() {
                Some(session) => {
                    session.handle_host_message(message, Instant::now());
                    self.flush_outbox();
                }
                None => self.backlog.push(message),
            },
            AppEvent::InputClosed => {
                tracing::info!("Host input closed, shutting down");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                let logical = size.to_logical::<u32>(scale);
                if let Some(session) = self.session.as_mut() {
                    session.backend_mut().set_size(logical.width, logical.height);
                    session.resize(logical.width, logical.height);
                }
            }

            WindowEvent::Focused(true) => {
                tracing::debug!("Window focused");
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.poll_and_schedule(event_loop);
    }
}
