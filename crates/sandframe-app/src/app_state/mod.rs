//! Windowed driver: one winit window, one `wry` webview per surface.
//!
//! Host messages arrive from a stdin reader thread as user events through an
//! `EventLoopProxy`; bridge messages are written to stdout.

mod core;
mod event_handler;
mod init;
mod polling;

use std::io::BufRead;
use std::thread;

use sandframe_webview::HostMessage;
use winit::event_loop::EventLoopProxy;

use crate::transport::parse_host_line;

pub use self::core::SandframeApp;

/// User events delivered to the winit loop.
#[derive(Debug)]
pub enum AppEvent {
    Host(HostMessage),
    /// The host closed stdin.
    InputClosed,
}

/// Read host messages from stdin on a background thread.
pub fn spawn_stdin_reader(proxy: EventLoopProxy<AppEvent>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("sandframe-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                };
                if let Some(message) = parse_host_line(&line) {
                    if proxy.send_event(AppEvent::Host(message)).is_err() {
                        return;
                    }
                }
            }
            let _ = proxy.send_event(AppEvent::InputClosed);
        })
        .map(|_| ())
}
