//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to the per-aggregate stores
//! - `DomainResult`: standard result type for domain operations

use super::parking::SessionStore;
use super::vehicle::PlateRegistry;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let plate = repos.plates().find_exact("B1234XYZ").await?;
///     let open = repos.sessions().find_open(plate.id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn plates(&self) -> &dyn PlateRegistry;
    fn sessions(&self) -> &dyn SessionStore;
}
