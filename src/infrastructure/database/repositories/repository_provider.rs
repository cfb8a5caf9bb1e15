//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::repositories::RepositoryProvider;
use crate::domain::{PlateRegistry, SessionStore};

use super::parking_repository::SeaOrmSessionStore;
use super::vehicle_repository::SeaOrmPlateRegistry;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let plate = repos.plates().find_exact("B1234XYZ").await?;
/// let open = repos.sessions().find_open(plate.id).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    plates: SeaOrmPlateRegistry,
    sessions: SeaOrmSessionStore,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            plates: SeaOrmPlateRegistry::new(db.clone()),
            sessions: SeaOrmSessionStore::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn plates(&self) -> &dyn PlateRegistry {
        &self.plates
    }

    fn sessions(&self) -> &dyn SessionStore {
        &self.sessions
    }
}
