//! Notification dispatch port

use async_trait::async_trait;

use super::model::Notification;
use crate::domain::DomainResult;

/// Fire-and-forget delivery of a notification.
///
/// The parking core calls this but never implements a transport itself.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> DomainResult<()>;
}
