//! Event bus for broadcasting telemetry to subscribers.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::emitter::{EmitResult, TelemetryEmitter};
use crate::event::TelemetryEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Event bus for broadcasting telemetry to all subscribers.
///
/// Publishing never blocks. When a receiver falls more than `capacity`
/// events behind, it skips ahead and logs the gap.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<TelemetryEvent>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the given capacity (at least 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers that got the event.
    pub fn publish(&self, event: TelemetryEvent) -> usize {
        let topic = event.topic.clone();
        if let Ok(count) = self.sender.send(Arc::new(event)) {
            trace!(%topic, receiver_count = count, "Event published");
            count
        } else {
            // No receivers - this is fine
            trace!(%topic, "No receivers for event");
            0
        }
    }

    /// Subscribe to every event.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), None)
    }

    /// Subscribe to events whose topic matches `topic_pattern`.
    ///
    /// The pattern is either an exact topic (`capsule.status`) or a prefix
    /// ending in `*` (`capsule.*`).
    #[must_use]
    pub fn subscribe_topic(&self, topic_pattern: impl Into<String>) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), Some(topic_pattern.into()))
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryEmitter for EventBus {
    fn emit(&self, event: TelemetryEvent) -> EmitResult<()> {
        self.publish(event);
        Ok(())
    }
}

/// Receiver for events from the event bus.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<TelemetryEvent>>,
    topic_pattern: Option<String>,
}

impl EventReceiver {
    fn new(
        receiver: broadcast::Receiver<Arc<TelemetryEvent>>,
        topic_pattern: Option<String>,
    ) -> Self {
        Self {
            receiver,
            topic_pattern,
        }
    }

    fn matches(&self, event: &TelemetryEvent) -> bool {
        self.topic_pattern
            .as_deref()
            .is_none_or(|pattern| event.matches(pattern))
    }

    /// Receive the next matching event.
    ///
    /// Returns `None` once the bus and all its clones are dropped.
    pub async fn recv(&mut self) -> Option<Arc<TelemetryEvent>> {
        let mut skipped: usize = 0;
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                    skipped = skipped.wrapping_add(1);
                    if skipped.is_multiple_of(100) {
                        tokio::task::yield_now().await;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next matching event without waiting.
    ///
    /// Returns `None` if nothing is queued or the channel is closed.
    pub fn try_recv(&mut self) -> Option<Arc<TelemetryEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics;
    use serde_json::json;

    fn status(code: u16) -> TelemetryEvent {
        TelemetryEvent::new(topics::STATUS, json!({ "status": code }))
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(EventBus::with_capacity(0).capacity(), 1);
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        assert_eq!(bus.publish(status(200)), 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.topic, topics::STATUS);
        assert_eq!(event.payload["status"], 200);
    }

    #[tokio::test]
    async fn test_no_subscribers_is_ok() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(status(404)), 0);
        assert!(bus.emit(status(404)).is_ok());
    }

    #[tokio::test]
    async fn test_topic_filter() {
        let bus = EventBus::new();
        let mut proofs = bus.subscribe_topic(topics::PROOF);
        let mut capsule = bus.subscribe_topic("capsule.*");

        bus.publish(status(200));
        bus.publish(TelemetryEvent::new(topics::PROOF, json!({"proof_hash": "p"})));
        bus.publish(TelemetryEvent::new("other.topic", json!({})));

        assert_eq!(proofs.recv().await.unwrap().topic, topics::PROOF);
        assert!(proofs.try_recv().is_none());

        assert_eq!(capsule.try_recv().unwrap().topic, topics::STATUS);
        assert_eq!(capsule.try_recv().unwrap().topic, topics::PROOF);
        assert!(capsule.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_receiver_skips_ahead() {
        let bus = EventBus::with_capacity(2);
        let mut receiver = bus.subscribe();

        for code in [1, 2, 3, 4] {
            bus.publish(status(code));
        }

        // Only the newest `capacity` events survive.
        assert_eq!(receiver.try_recv().unwrap().payload["status"], 3);
        assert_eq!(receiver.try_recv().unwrap().payload["status"], 4);
        assert!(receiver.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_closed() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        drop(bus);
        assert!(receiver.recv().await.is_none());
    }
}
