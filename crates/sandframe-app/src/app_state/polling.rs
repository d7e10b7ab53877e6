//! Surface event polling, timers, frame cadence and host output.

use std::time::Instant;

use winit::event_loop::{ActiveEventLoop, ControlFlow};

use super::core::SandframeApp;
use crate::transport::write_messages;

impl SandframeApp {
    /// Drain webview events, fire due timers and frames, then schedule the
    /// next wake-up.
    pub(super) fn poll_and_schedule(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();

        let Some(session) = self.session.as_mut() else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(now + self.frame_interval));
            return;
        };

        let events = session.backend().drain_events();
        for event in events {
            session.handle_surface_event(event);
        }

        session.poll_timers(now);

        if session.wants_animation_frame()
            && now.duration_since(self.last_frame) >= self.frame_interval
        {
            self.last_frame = now;
            session.animation_frame();
        }

        let next_frame = now + self.frame_interval;
        let wake = session
            .next_deadline()
            .map_or(next_frame, |deadline| deadline.min(next_frame));

        self.flush_outbox();
        event_loop.set_control_flow(ControlFlow::WaitUntil(wake));
    }

    /// Write everything the session produced to stdout.
    pub(super) fn flush_outbox(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let messages = session.drain_outbox();
        let stdout = std::io::stdout();
        if let Err(e) = write_messages(&mut stdout.lock(), &messages) {
            tracing::error!("Failed to write to host: {e}");
        }
    }
}
