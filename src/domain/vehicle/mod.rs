//! Vehicle aggregate
//!
//! Registered plates and the registry interface the matcher reads from.

pub mod model;
pub mod repository;

pub use model::Plate;
pub use repository::PlateRegistry;
