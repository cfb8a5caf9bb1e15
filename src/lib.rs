//! # Parking LPR
//!
//! Parking check-in/check-out tracker driven by license-plate recognition.
//! OCR readings are reconciled against registered plates and turned into
//! parking session transitions.
//!
//! ## Architecture
//!
//! - **matching**: plate normalization, edit distance and the match engine
//! - **domain**: entities and collaborator ports (registry, session store, notifier)
//! - **application**: the parking state resolver and the notification event bus
//! - **infrastructure**: SeaORM/SQLite and in-memory storage, notifier adapters
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod matching;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{EventOutcome, ParkingEvent, ParkingService};
pub use domain::DomainError;
pub use matching::{normalize, MatchEngine, MatchResult, MatchStrategy};

// Re-export database types for easy access
pub use infrastructure::{init_database, run_migrations, DatabaseConfig};

pub use interfaces::create_api_router;
pub use server::{init_tracing, ServerHandle, ServerOptions};
