//! Trigger lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to the events a trigger invocation emits as it moves
//! through decision and (possibly) delayed launch.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the decision transaction and the delayed-launch
//!   supervisor, via the engine's bus.
//! - **Consumers**: the engine's subscriber listener (fans out to
//!   [`Subscriber`](crate::Subscriber) implementations) and any receiver
//!   obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
