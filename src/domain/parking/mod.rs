//! Parking aggregate
//!
//! Contains the ParkingSession entity, related types, and store interface.

pub mod model;
pub mod repository;

pub use model::{CheckOut, NewParkingSession, ParkingSession, ParkingStatus};
pub use repository::SessionStore;
