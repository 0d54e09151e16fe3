//! # Event subscribers.
//!
//! This module provides the [`Subscriber`] trait for plugging custom event
//! handlers into the engine, and a built-in [`LogWriter`] for demos.
//!
//! ```text
//! Event flow:
//!   decision / launcher ── publish(Event) ──► Bus ──► engine listener
//!                                                        │
//!                                                   ┌────┴────┬─────────┐
//!                                                   ▼         ▼         ▼
//!                                                LogWriter  Metrics   Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use cronvisor::{Event, EventKind, Subscriber};
//! use async_trait::async_trait;
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Subscriber for Alerts {
//!     async fn handle(&self, event: &Event) {
//!         if event.kind == EventKind::LaunchAborted {
//!             // page someone...
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscriber;
