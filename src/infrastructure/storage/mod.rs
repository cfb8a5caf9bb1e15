//! Storage implementations that do not need a database

pub mod memory;

pub use memory::{InMemoryPlateRegistry, InMemoryRepositoryProvider, InMemorySessionStore};
