//! Domain layer: entities and the ports of the parking core's collaborators.

pub mod notification;
pub mod parking;
pub mod repositories;
pub mod vehicle;

// Re-export commonly used types
pub use notification::{AlertType, Notification, Notifier, Recipient};
pub use parking::{CheckOut, NewParkingSession, ParkingSession, ParkingStatus, SessionStore};
pub use repositories::{DomainResult, RepositoryProvider};
pub use vehicle::{Plate, PlateRegistry};

pub use crate::shared::errors::DomainError;
