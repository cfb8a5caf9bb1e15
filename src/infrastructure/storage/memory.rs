//! In-memory storage implementation

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{
    CheckOut, DomainError, DomainResult, NewParkingSession, ParkingSession, Plate, PlateRegistry,
    RepositoryProvider, SessionStore,
};

/// In-memory plate registry for development and testing
pub struct InMemoryPlateRegistry {
    plates: DashMap<i32, Plate>,
    counter: AtomicI32,
}

impl InMemoryPlateRegistry {
    pub fn new() -> Self {
        Self {
            plates: DashMap::new(),
            counter: AtomicI32::new(1),
        }
    }

    /// Insert a plate keeping its ID.
    pub fn insert(&self, plate: Plate) {
        self.counter.fetch_max(plate.id + 1, Ordering::SeqCst);
        self.plates.insert(plate.id, plate);
    }
}

impl Default for InMemoryPlateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlateRegistry for InMemoryPlateRegistry {
    async fn list_plates(&self) -> DomainResult<Vec<Plate>> {
        Ok(self.plates.iter().map(|p| p.value().clone()).collect())
    }

    async fn find_exact(&self, normalized_plate: &str) -> DomainResult<Option<Plate>> {
        Ok(self
            .plates
            .iter()
            .filter(|p| p.normalized_plate() == normalized_plate)
            .min_by_key(|p| p.id)
            .map(|p| p.value().clone()))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Plate>> {
        Ok(self.plates.get(&id).map(|p| p.clone()))
    }

    async fn save(&self, mut plate: Plate) -> DomainResult<Plate> {
        plate.id = self.counter.fetch_add(1, Ordering::SeqCst);
        self.plates.insert(plate.id, plate.clone());
        Ok(plate)
    }

    async fn update(&self, plate: Plate) -> DomainResult<()> {
        match self.plates.get_mut(&plate.id) {
            Some(mut existing) => {
                *existing = plate;
                Ok(())
            }
            None => Err(DomainError::NotFound {
                entity: "Vehicle",
                field: "id",
                value: plate.id.to_string(),
            }),
        }
    }
}

/// In-memory session store.
///
/// `open_by_vehicle` is the one-open-session guard: its entry for a vehicle
/// is held while a session is opened or closed, so racing callers on the
/// same vehicle are serialized. Lock order is always `open_by_vehicle`
/// before `sessions`.
pub struct InMemorySessionStore {
    sessions: DashMap<i32, ParkingSession>,
    open_by_vehicle: DashMap<i32, i32>,
    counter: AtomicI32,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            open_by_vehicle: DashMap::new(),
            counter: AtomicI32::new(1),
        }
    }

    fn newest_first(mut sessions: Vec<ParkingSession>) -> Vec<ParkingSession> {
        sessions.sort_by(|a, b| {
            b.check_in_time
                .cmp(&a.check_in_time)
                .then_with(|| b.id.cmp(&a.id))
        });
        sessions
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_open(&self, vehicle_id: i32) -> DomainResult<Option<ParkingSession>> {
        let Some(id) = self.open_by_vehicle.get(&vehicle_id).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingSession>> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn create_open(&self, new: NewParkingSession) -> DomainResult<ParkingSession> {
        match self.open_by_vehicle.entry(new.vehicle_id) {
            Entry::Occupied(open) => Err(DomainError::Conflict(format!(
                "vehicle {} already has open session {}",
                new.vehicle_id,
                open.get()
            ))),
            Entry::Vacant(slot) => {
                let id = self.counter.fetch_add(1, Ordering::SeqCst);
                let session = ParkingSession::open(id, new);
                self.sessions.insert(id, session.clone());
                slot.insert(id);
                Ok(session)
            }
        }
    }

    async fn close_open(&self, id: i32, checkout: CheckOut) -> DomainResult<Option<ParkingSession>> {
        let Some(vehicle_id) = self.sessions.get(&id).map(|s| s.vehicle_id) else {
            return Ok(None);
        };

        match self.open_by_vehicle.entry(vehicle_id) {
            Entry::Occupied(open) if *open.get() == id => {
                let closed = {
                    let Some(mut session) = self.sessions.get_mut(&id) else {
                        return Ok(None);
                    };
                    if !session.is_check_out_confirmed {
                        return Ok(None);
                    }
                    session.close(checkout);
                    session.clone()
                };
                open.remove();
                Ok(Some(closed))
            }
            _ => Ok(None),
        }
    }

    async fn confirm_checkout(
        &self,
        vehicle_id: i32,
        user_id: i32,
    ) -> DomainResult<Option<ParkingSession>> {
        let Some(open) = self.open_by_vehicle.get(&vehicle_id) else {
            return Ok(None);
        };
        let Some(mut session) = self.sessions.get_mut(open.value()) else {
            return Ok(None);
        };
        if session.user_id != user_id {
            return Ok(None);
        }
        session.confirm_checkout();
        Ok(Some(session.clone()))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<ParkingSession>> {
        Ok(Self::newest_first(
            self.sessions
                .iter()
                .filter(|s| s.user_id == user_id)
                .map(|s| s.value().clone())
                .collect(),
        ))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingSession>> {
        Ok(Self::newest_first(
            self.sessions.iter().map(|s| s.value().clone()).collect(),
        ))
    }
}

/// Repository provider backed by the in-memory stores
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    plates: InMemoryPlateRegistry,
    sessions: InMemorySessionStore,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a plate with a fixed ID.
    pub fn insert_plate(&self, plate: Plate) {
        self.plates.insert(plate);
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn plates(&self) -> &dyn PlateRegistry {
        &self.plates
    }

    fn sessions(&self) -> &dyn SessionStore {
        &self.sessions
    }
}
