//! Parking session store interface

use async_trait::async_trait;

use super::model::{CheckOut, NewParkingSession, ParkingSession};
use crate::domain::DomainResult;

/// Storage for parking sessions.
///
/// Implementations must keep at most one open session per vehicle even
/// under concurrent calls: `create_open` and `close_open` are conditional,
/// single-step operations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The open session (no check-out time) of a vehicle, if any.
    async fn find_open(&self, vehicle_id: i32) -> DomainResult<Option<ParkingSession>>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSession>>;

    /// Open a new session.
    ///
    /// Fails with `DomainError::Conflict` when the vehicle already has one.
    async fn create_open(&self, new: NewParkingSession) -> DomainResult<ParkingSession>;

    /// Close session `id` iff it is still open and its check-out is confirmed.
    ///
    /// `Ok(None)` means another caller closed it first (or it was never
    /// confirmed); nothing was written.
    async fn close_open(&self, id: i32, checkout: CheckOut) -> DomainResult<Option<ParkingSession>>;

    /// Mark the open session of `vehicle_id` owned by `user_id` as confirmed.
    ///
    /// `Ok(None)` when there is no such open session.
    async fn confirm_checkout(
        &self,
        vehicle_id: i32,
        user_id: i32,
    ) -> DomainResult<Option<ParkingSession>>;

    /// Sessions of one user, newest check-in first.
    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<ParkingSession>>;

    /// All sessions, newest check-in first.
    async fn find_all(&self) -> DomainResult<Vec<ParkingSession>>;
}
