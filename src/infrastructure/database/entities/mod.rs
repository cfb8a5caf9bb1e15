//! Database entities module

pub mod parking;
pub mod vehicle;

pub use parking::Entity as Parking;
pub use vehicle::Entity as Vehicle;
