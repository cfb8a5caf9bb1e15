//! Application events (pub/sub)
//!
//! Notifications are fanned out over a broadcast channel; delivery
//! transports (push, websocket, mail) subscribe to it.

pub mod event_bus;
pub mod message;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use message::EventMessage;
