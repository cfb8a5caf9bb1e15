//! Notifier that publishes onto the application event bus

use async_trait::async_trait;
use tracing::debug;

use crate::application::events::SharedEventBus;
use crate::domain::{DomainResult, Notification, Notifier};

/// Hands notifications to whatever transports subscribe to the bus.
///
/// Publishing never fails: a notification with no listening transport is
/// dropped, the same way the bus treats any event nobody subscribed to.
pub struct EventBusNotifier {
    bus: SharedEventBus,
}

impl EventBusNotifier {
    pub fn new(bus: SharedEventBus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl Notifier for EventBusNotifier {
    async fn notify(&self, notification: Notification) -> DomainResult<()> {
        let alert = notification.alert.as_str();
        let delivered = self.bus.publish(notification);
        debug!(alert, delivered, "Notification handed to event bus");
        Ok(())
    }
}
