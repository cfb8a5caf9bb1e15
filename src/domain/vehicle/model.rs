//! Registered vehicle plate

use crate::matching::normalize;

/// A registry entry: one registered vehicle and its license plate.
///
/// `normalized_plate` is derived from `raw_plate` and is only ever updated
/// together with it, so the two can never drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Plate {
    /// Vehicle ID
    pub id: i32,
    /// Owner (user) of the vehicle
    pub owner_id: i32,
    /// Display name of the vehicle, e.g. "Blue Avanza"
    pub name: Option<String>,
    raw_plate: String,
    normalized_plate: String,
}

impl Plate {
    pub fn new(id: i32, raw_plate: impl Into<String>, owner_id: i32) -> Self {
        let raw_plate = raw_plate.into();
        let normalized_plate = normalize(&raw_plate);
        Self {
            id,
            owner_id,
            name: None,
            raw_plate,
            normalized_plate,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Plate as entered, trimmed and uppercased the way the vehicle form stores it.
    pub fn raw_plate(&self) -> &str {
        &self.raw_plate
    }

    pub fn normalized_plate(&self) -> &str {
        &self.normalized_plate
    }

    /// Replace the plate text (vehicle edit) and recompute the comparison form.
    pub fn set_raw_plate(&mut self, raw_plate: impl Into<String>) {
        self.raw_plate = raw_plate.into();
        self.normalized_plate = normalize(&self.raw_plate);
    }

    /// Plates that normalize to nothing can never be matched.
    pub fn is_matchable(&self) -> bool {
        !self.normalized_plate.is_empty()
    }
}
