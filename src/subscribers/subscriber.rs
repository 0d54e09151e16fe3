//! # Core subscriber trait.
//!
//! `Subscriber` is the extension point for reacting to trigger lifecycle
//! events: dashboards, alerting, bridging to an external metrics pipeline.
//! Subscribers attached to an engine are driven by a single listener task
//! fed from the engine's [`Bus`](crate::Bus).

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from the engine's listener task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits);
/// a slow subscriber delays delivery to the subscribers after it.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Handles a single event.
    async fn handle(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
