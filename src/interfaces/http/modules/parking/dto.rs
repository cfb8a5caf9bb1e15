//! Parking DTOs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::{
    DailyCount, DateRange, EventOutcome, ParkingStatistics, SessionDetails, SessionDuration,
    UserCount,
};
use crate::domain::DomainResult;
use crate::config::StrategyName;
use crate::domain::{DomainError, ParkingSession, Plate};
use crate::interfaces::http::common::RejectionBody;
use crate::matching::MatchCandidate;

/// A camera event: the plate text read at a gate
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ParkingEventRequest {
    /// Plate text as read by OCR
    #[validate(length(min = 1, max = 20))]
    #[serde(alias = "license_plate")]
    pub ocr_plate_text: String,
    /// OCR confidence in [0, 1]
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: Option<f64>,
    /// Defaults to the configured strategy
    pub strategy: Option<StrategyName>,
    /// Similarity threshold for `threshold`, max edit distance for
    /// `bounded-distance`. Defaults to the configured value.
    pub threshold_or_max_distance: Option<f64>,
    /// Reference to the captured image
    #[validate(length(max = 255))]
    pub image_ref: Option<String>,
}

/// Unreadable bodies are still answered in the event contract.
impl RejectionBody for ParkingEventRequest {
    fn rejection(status: StatusCode, message: String) -> Response {
        (status, Json(ParkingEventResponse::InvalidInput { message })).into_response()
    }
}

/// Owner confirms the vehicle may leave. One of `vehicle_id` and
/// `license_plate` is required.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConfirmCheckOutRequest {
    pub vehicle_id: Option<i32>,
    #[validate(length(min = 1, max = 20))]
    pub license_plate: Option<String>,
    pub user_id: i32,
}

impl RejectionBody for ConfirmCheckOutRequest {}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlateDto {
    pub id: i32,
    pub license_plate: String,
    pub normalized_plate: String,
    pub owner_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PlateDto {
    pub fn from_domain(p: &Plate) -> Self {
        Self {
            id: p.id,
            license_plate: p.raw_plate().to_string(),
            normalized_plate: p.normalized_plate().to_string(),
            owner_id: p.owner_id,
            name: p.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParkingSessionDto {
    pub id: i32,
    pub vehicle_id: i32,
    pub user_id: i32,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_image: Option<String>,
    pub is_check_out_confirmed: bool,
    /// parked, pending_checkout, checked_out
    pub status: String,
}

impl ParkingSessionDto {
    pub fn from_domain(s: ParkingSession) -> Self {
        Self {
            id: s.id,
            vehicle_id: s.vehicle_id,
            user_id: s.user_id,
            check_in_time: s.check_in_time,
            check_out_time: s.check_out_time,
            check_in_image: s.check_in_image,
            check_out_image: s.check_out_image,
            is_check_out_confirmed: s.is_check_out_confirmed,
            status: s.status.as_str().to_string(),
        }
    }
}

/// Result of recording a camera event, tagged by `outcome`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ParkingEventResponse {
    CheckIn {
        session: ParkingSessionDto,
        matched_plate: PlateDto,
        distance: usize,
        ratio: f64,
    },
    CheckedOut {
        session: ParkingSessionDto,
        matched_plate: PlateDto,
        distance: usize,
        ratio: f64,
    },
    PendingConfirmation {
        session: ParkingSessionDto,
        matched_plate: PlateDto,
        distance: usize,
        ratio: f64,
    },
    Ambiguous {
        candidates: Vec<PlateDto>,
        distance: usize,
    },
    NotFound {
        closest_distance: Option<usize>,
    },
    InvalidInput {
        message: String,
    },
    NoActiveSession {
        vehicle_id: i32,
    },
    Conflict {
        message: String,
    },
    Error {
        message: String,
    },
}

impl ParkingEventResponse {
    pub fn from_outcome(outcome: EventOutcome) -> Self {
        let parts = |session: ParkingSession, m: MatchCandidate| {
            (
                ParkingSessionDto::from_domain(session),
                PlateDto::from_domain(&m.plate),
                m.distance,
                m.ratio,
            )
        };
        match outcome {
            EventOutcome::CheckedIn { session, matched } => {
                let (session, matched_plate, distance, ratio) = parts(session, matched);
                Self::CheckIn {
                    session,
                    matched_plate,
                    distance,
                    ratio,
                }
            }
            EventOutcome::CheckedOut { session, matched } => {
                let (session, matched_plate, distance, ratio) = parts(session, matched);
                Self::CheckedOut {
                    session,
                    matched_plate,
                    distance,
                    ratio,
                }
            }
            EventOutcome::PendingConfirmation { session, matched } => {
                let (session, matched_plate, distance, ratio) = parts(session, matched);
                Self::PendingConfirmation {
                    session,
                    matched_plate,
                    distance,
                    ratio,
                }
            }
        }
    }

    pub fn from_error(error: DomainError) -> Self {
        match error {
            DomainError::AmbiguousMatch {
                candidates,
                distance,
            } => Self::Ambiguous {
                candidates: candidates.iter().map(PlateDto::from_domain).collect(),
                distance,
            },
            DomainError::VehicleNotFound { closest_distance } => {
                Self::NotFound { closest_distance }
            }
            DomainError::InvalidInput(message) | DomainError::Validation(message) => {
                Self::InvalidInput { message }
            }
            DomainError::NoActiveSession { vehicle_id } => Self::NoActiveSession { vehicle_id },
            DomainError::Conflict(message) => Self::Conflict { message },
            other => Self::Error {
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionDurationDto {
    pub total_minutes: i64,
    pub total_hours: i64,
    pub human_readable: String,
}

impl From<SessionDuration> for SessionDurationDto {
    fn from(d: SessionDuration) -> Self {
        Self {
            total_minutes: d.total_minutes,
            total_hours: d.total_hours,
            human_readable: d.human_readable,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionDetailsDto {
    pub parking: ParkingSessionDto,
    pub vehicle: Option<PlateDto>,
    /// Set once the session is closed
    pub duration: Option<SessionDurationDto>,
    pub is_active: bool,
    pub is_expired: bool,
}

impl SessionDetailsDto {
    pub fn from_domain(d: SessionDetails) -> Self {
        Self {
            vehicle: d.plate.as_ref().map(PlateDto::from_domain),
            parking: ParkingSessionDto::from_domain(d.session),
            duration: d.duration.map(Into::into),
            is_active: d.is_active,
            is_expired: d.is_expired,
        }
    }
}

/// Check-in date window for statistics, both ends inclusive
#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatisticsQuery {
    /// YYYY-MM-DD
    pub date_from: Option<NaiveDate>,
    /// YYYY-MM-DD
    pub date_to: Option<NaiveDate>,
}

impl StatisticsQuery {
    pub fn range(&self) -> DomainResult<DateRange> {
        DateRange::new(self.date_from, self.date_to)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyCountDto {
    pub date: NaiveDate,
    pub count: u64,
}

impl From<DailyCount> for DailyCountDto {
    fn from(d: DailyCount) -> Self {
        Self {
            date: d.date,
            count: d.count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserCountDto {
    pub user_id: i32,
    pub parking_count: u64,
}

impl From<UserCount> for UserCountDto {
    fn from(u: UserCount) -> Self {
        Self {
            user_id: u.user_id,
            parking_count: u.parking_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParkingStatisticsDto {
    pub total_records: u64,
    pub active_records: u64,
    pub completed_records: u64,
    pub expired_records: u64,
    /// Percentage of completed sessions
    pub completion_rate: f64,
    /// 24 entries, check-ins per UTC hour over the last day
    pub hourly_distribution: Vec<u64>,
    /// Check-ins per day over the last week, oldest first
    pub daily_distribution: Vec<DailyCountDto>,
    /// Up to five owners with the most sessions
    pub top_users: Vec<UserCountDto>,
}

impl From<ParkingStatistics> for ParkingStatisticsDto {
    fn from(s: ParkingStatistics) -> Self {
        Self {
            total_records: s.total_records,
            active_records: s.active_records,
            completed_records: s.completed_records,
            expired_records: s.expired_records,
            completion_rate: s.completion_rate,
            hourly_distribution: s.hourly_distribution.to_vec(),
            daily_distribution: s.daily_distribution.into_iter().map(Into::into).collect(),
            top_users: s.top_users.into_iter().map(Into::into).collect(),
        }
    }
}
