pub mod model;
pub mod port;

pub use model::{AlertType, Notification, Recipient};
pub use port::Notifier;
