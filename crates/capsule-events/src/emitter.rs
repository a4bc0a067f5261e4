//! Emitter trait, the tracing-backed emitter and a fan-out combinator.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::event::TelemetryEvent;

/// Errors an emitter may report. Callers treat all of them as best-effort
/// failures.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The event could not be encoded.
    #[error("failed to encode event: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The sink refused the event.
    #[error("emitter rejected event on {topic}: {reason}")]
    Rejected {
        /// Topic of the rejected event.
        topic: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for emission.
pub type EmitResult<T> = Result<T, EmitError>;

/// Sink for telemetry events.
///
/// Implementations must not block the caller for longer than it takes to
/// hand the event off.
pub trait TelemetryEmitter: Send + Sync {
    /// Hand off one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event was not accepted.
    fn emit(&self, event: TelemetryEvent) -> EmitResult<()>;
}

/// Emitter that writes each event to the `capsule::telemetry` log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEmitter;

impl TelemetryEmitter for TracingEmitter {
    fn emit(&self, event: TelemetryEvent) -> EmitResult<()> {
        let payload = serde_json::to_string(&event.payload)?;
        info!(
            target: "capsule::telemetry",
            topic = %event.topic,
            event_id = %event.metadata.event_id,
            payload = %payload,
            "Telemetry event"
        );
        Ok(())
    }
}

/// Emitter that hands every event to each of its sinks in order.
///
/// A failing sink does not stop later sinks from receiving the event; the
/// first error is returned after all sinks have been tried.
#[derive(Clone, Default)]
pub struct FanoutEmitter {
    sinks: Vec<Arc<dyn TelemetryEmitter>>,
}

impl FanoutEmitter {
    /// Create a fan-out with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn TelemetryEmitter>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanoutEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutEmitter")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl TelemetryEmitter for FanoutEmitter {
    fn emit(&self, event: TelemetryEvent) -> EmitResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event.clone()) {
                warn!(topic = %event.topic, error = %e, "Fan-out sink rejected event");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tracing_emitter_accepts_events() {
        let emitter = TracingEmitter;
        let event = TelemetryEvent::new("capsule.status", json!({"status": 200}));
        assert!(emitter.emit(event).is_ok());
    }

    #[test]
    fn test_emitter_is_object_safe() {
        let emitter: Box<dyn TelemetryEmitter> = Box::new(TracingEmitter);
        assert!(emitter.emit(TelemetryEvent::new("t", json!(null))).is_ok());
    }

    #[derive(Default)]
    struct Counting(std::sync::atomic::AtomicUsize);

    impl TelemetryEmitter for Counting {
        fn emit(&self, _event: TelemetryEvent) -> EmitResult<()> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    struct Refusing;

    impl TelemetryEmitter for Refusing {
        fn emit(&self, event: TelemetryEvent) -> EmitResult<()> {
            Err(EmitError::Rejected {
                topic: event.topic,
                reason: "closed".to_owned(),
            })
        }
    }

    #[test]
    fn test_fanout_reaches_every_sink_despite_failures() {
        let counter = Arc::new(Counting::default());
        let fanout = FanoutEmitter::new()
            .with_sink(Arc::new(Refusing))
            .with_sink(counter.clone());
        assert_eq!(fanout.len(), 2);

        let result = fanout.emit(TelemetryEvent::new("capsule.status", json!({})));
        assert!(matches!(result, Err(EmitError::Rejected { .. })));
        assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_fanout_accepts() {
        let fanout = FanoutEmitter::new();
        assert!(fanout.is_empty());
        assert!(fanout.emit(TelemetryEvent::new("t", json!(null))).is_ok());
    }
}
