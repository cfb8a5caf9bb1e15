//! Plate registry interface

use async_trait::async_trait;

use super::model::Plate;
use crate::domain::DomainResult;

/// Read access to the set of known vehicle plates.
///
/// The vehicle store owns these records; the matching engine only works on
/// the snapshots returned here.
#[async_trait]
pub trait PlateRegistry: Send + Sync {
    /// Full registry snapshot.
    async fn list_plates(&self) -> DomainResult<Vec<Plate>>;

    /// Plate whose normalized form equals `normalized_plate`.
    async fn find_exact(&self, normalized_plate: &str) -> DomainResult<Option<Plate>>;

    /// Plates whose normalized form starts with `first`.
    ///
    /// Stores that can filter server-side should override this.
    async fn list_by_first_char(&self, first: char) -> DomainResult<Vec<Plate>> {
        Ok(self
            .list_plates()
            .await?
            .into_iter()
            .filter(|p| p.normalized_plate().starts_with(first))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Plate>>;

    /// Register a vehicle. The stored plate gets a fresh ID which is returned.
    async fn save(&self, plate: Plate) -> DomainResult<Plate>;

    /// Replace the stored plate with the same ID.
    async fn update(&self, plate: Plate) -> DomainResult<()>;
}
