//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod parking_repository;
pub mod repository_provider;
pub mod vehicle_repository;

pub use parking_repository::SeaOrmSessionStore;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use vehicle_repository::SeaOrmPlateRegistry;

use crate::domain::DomainError;

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Persistence(e.to_string())
}
