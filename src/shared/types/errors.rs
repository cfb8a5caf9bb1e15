use thiserror::Error;

use crate::domain::Plate;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Plate text was empty after normalization.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Vehicle not found (closest distance: {})", fmt_distance(*closest_distance))]
    VehicleNotFound { closest_distance: Option<usize> },

    #[error("Ambiguous match: {} plates at distance {distance}", candidates.len())]
    AmbiguousMatch {
        candidates: Vec<Plate>,
        distance: usize,
    },

    #[error("No active parking session for vehicle {vehicle_id}")]
    NoActiveSession { vehicle_id: i32 },

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

fn fmt_distance(distance: Option<usize>) -> String {
    distance.map_or_else(|| "n/a".to_string(), |d| d.to_string())
}

impl DomainError {
    /// Stable machine-readable name, used for metrics labels and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::VehicleNotFound { .. } => "not_found",
            Self::AmbiguousMatch { .. } => "ambiguous",
            Self::NoActiveSession { .. } => "no_active_session",
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Persistence(_) => "persistence",
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<InfraError> for DomainError {
    fn from(e: InfraError) -> Self {
        DomainError::Persistence(e.to_string())
    }
}
