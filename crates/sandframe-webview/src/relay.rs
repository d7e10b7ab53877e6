//! Outbound message queue and inbound passthrough.

use std::collections::VecDeque;

use serde_json::Value;

use crate::protocol::{BridgeMessage, ContentMessage};

/// Where a host payload should go right now.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Post to the active surface immediately.
    Deliver(Value),
    /// Held until the pending surface is promoted.
    Queued,
    /// No surface at all; the payload is gone.
    Dropped,
}

/// FIFO of payloads waiting for the pending surface.
#[derive(Debug, Default)]
pub struct MessageRelay {
    queue: VecDeque<Value>,
}

impl MessageRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a host payload given which slots exist.
    pub fn send(&mut self, payload: Value, has_active: bool, has_pending: bool) -> Delivery {
        if has_active {
            Delivery::Deliver(payload)
        } else if has_pending {
            self.queue.push_back(payload);
            Delivery::Queued
        } else {
            Delivery::Dropped
        }
    }

    /// Take every queued payload, in send order.
    pub fn drain(&mut self) -> Vec<Value> {
        self.queue.drain(..).collect()
    }

    /// Discard queued payloads (a newer content update superseded them).
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Content → host passthrough, tagged with the declared command.
    pub fn receive(&self, message: ContentMessage) -> BridgeMessage {
        BridgeMessage::Relay(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn active_delivers_immediately() {
        let mut relay = MessageRelay::new();
        assert_eq!(
            relay.send(json!(1), true, true),
            Delivery::Deliver(json!(1))
        );
        assert!(relay.is_empty());
    }

    #[test]
    fn pending_queues_in_order() {
        let mut relay = MessageRelay::new();
        assert_eq!(relay.send(json!("a"), false, true), Delivery::Queued);
        assert_eq!(relay.send(json!("b"), false, true), Delivery::Queued);
        assert_eq!(relay.len(), 2);
        assert_eq!(relay.drain(), vec![json!("a"), json!("b")]);
        assert!(relay.drain().is_empty());
    }

    #[test]
    fn no_surface_drops() {
        let mut relay = MessageRelay::new();
        assert_eq!(relay.send(json!(1), false, false), Delivery::Dropped);
        assert!(relay.is_empty());
    }

    #[test]
    fn clear_discards_queue() {
        let mut relay = MessageRelay::new();
        relay.send(json!(1), false, true);
        relay.clear();
        assert!(relay.drain().is_empty());
    }

    #[test]
    fn receive_tags_with_command() {
        let relay = MessageRelay::new();
        let msg = relay.receive(ContentMessage::new("custom-command", json!({"x": 1})));
        assert_eq!(msg.channel(), "custom-command");
    }
}
