//! Capsule Events - Telemetry dispatch for capsule resolution.
//!
//! This crate provides:
//! - The telemetry event type and well-known topics
//! - The [`TelemetryEmitter`] trait the resolver emits through
//! - A broadcast-based [`EventBus`] for async subscribers
//! - A [`TracingEmitter`] that writes events to the log
//! - A [`FanoutEmitter`] that feeds several sinks at once
//!
//! # Architecture
//!
//! Emission is fire-and-forget. `emit` never blocks: the bus performs a
//! non-blocking broadcast send, and slow receivers lag rather than apply
//! back-pressure. Callers log and discard emission errors.
//!
//! # Example
//!
//! ```rust
//! use capsule_events::{EventBus, TelemetryEmitter, TelemetryEvent, topics};
//! use serde_json::json;
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe_topic("capsule.*");
//!
//! bus.emit(TelemetryEvent::new(topics::STATUS, json!({"status": 200})))
//!     .unwrap();
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.topic, topics::STATUS);
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;
pub mod topics;

mod bus;
mod emitter;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use emitter::{EmitError, EmitResult, FanoutEmitter, TelemetryEmitter, TracingEmitter};
pub use event::{EventMetadata, TelemetryEvent};
