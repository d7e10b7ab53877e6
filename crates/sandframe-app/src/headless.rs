//! Headless driver: in-memory surfaces on a tokio runtime.

use std::time::{Duration, Instant};

use sandframe_webview::{BridgeSession, HeadlessBackend, SessionOptions};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::transport::{encode_line, parse_host_line};

/// Run a session until input closes and no timer or frame is outstanding.
pub async fn run<R, W>(
    reader: R,
    mut writer: W,
    options: SessionOptions,
    frame_interval: Duration,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = BridgeSession::new(HeadlessBackend::new(), options);
    session.start();

    let mut lines = reader.lines();
    let mut input_open = true;
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let events = session.backend().drain_events();
        for event in events {
            session.handle_surface_event(event);
        }
        flush(&mut session, &mut writer).await?;

        let deadline = session.next_deadline();
        if !input_open && deadline.is_none() && !session.wants_animation_frame() {
            break;
        }
        let sleep_target = deadline
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(|| tokio::time::Instant::now() + frame_interval);

        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                Some(line) => {
                    if let Some(message) = parse_host_line(&line) {
                        session.handle_host_message(message, Instant::now());
                    }
                }
                None => {
                    debug!("host input closed");
                    input_open = false;
                }
            },
            _ = tokio::time::sleep_until(sleep_target), if deadline.is_some() => {
                session.poll_timers(Instant::now());
            }
            _ = frames.tick(), if session.wants_animation_frame() => {
                session.animation_frame();
            }
        }
    }

    info!(session = %session.id(), "headless session finished");
    Ok(())
}

async fn flush<W: AsyncWrite + Unpin>(
    session: &mut BridgeSession<HeadlessBackend>,
    writer: &mut W,
) -> std::io::Result<()> {
    let messages = session.drain_outbox();
    if messages.is_empty() {
        return Ok(());
    }
    for message in &messages {
        writer.write_all(encode_line(message).as_bytes()).await?;
    }
    writer.flush().await
}
