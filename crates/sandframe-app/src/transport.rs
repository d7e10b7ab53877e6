//! Newline-delimited JSON host transport.

use std::io::Write;

use sandframe_webview::{BridgeMessage, HostMessage};
use tracing::warn;

/// Parse one input line. Blank lines are skipped; invalid ones are logged
/// and skipped.
pub fn parse_host_line(line: &str) -> Option<HostMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match HostMessage::parse(line) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(error = %e, line_len = line.len(), "host message rejected");
            None
        }
    }
}

/// Encode a bridge message as one output line, newline included.
pub fn encode_line(message: &BridgeMessage) -> String {
    let mut line = message.to_wire().to_json();
    line.push('\n');
    line
}

/// Write messages to a blocking sink and flush it.
pub fn write_messages<W: Write>(out: &mut W, messages: &[BridgeMessage]) -> std::io::Result<()> {
    if messages.is_empty() {
        return Ok(());
    }
    for message in messages {
        out.write_all(encode_line(message).as_bytes())?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_invalid_lines() {
        assert!(parse_host_line("   ").is_none());
        assert!(parse_host_line("{").is_none());
        assert!(parse_host_line(r#"{"channel":"nope"}"#).is_none());
        assert_eq!(
            parse_host_line(r#"{"channel":"focus"}"#),
            Some(HostMessage::Focus)
        );
    }

    #[test]
    fn encodes_one_line_per_message() {
        let mut out = Vec::new();
        write_messages(
            &mut out,
            &[
                BridgeMessage::DidSetContent,
                BridgeMessage::DidClickLink("https://x.test/".into()),
            ],
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "{\"channel\":\"did-set-content\"}\n{\"channel\":\"did-click-link\",\"args\":[\"https://x.test/\"]}\n"
        );
    }
}
