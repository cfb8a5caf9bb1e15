//! Notifier implementations

pub mod event_bus_notifier;

pub use event_bus_notifier::EventBusNotifier;
