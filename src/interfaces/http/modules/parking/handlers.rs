//! Parking API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use super::dto::{
    ConfirmCheckOutRequest, ParkingEventRequest, ParkingEventResponse, ParkingSessionDto,
    ParkingStatisticsDto, SessionDetailsDto, StatisticsQuery,
};
use crate::application::{EventOutcome, ParkingEvent, ParkingService};
use crate::config::MatchingConfig;
use crate::interfaces::http::common::{
    api_error, status_for, ApiError, ApiResponse, PaginatedResponse, PaginationQuery,
    ValidatedJson,
};

/// Parking handler state
#[derive(Clone)]
pub struct ParkingAppState {
    pub service: Arc<ParkingService>,
    pub matching: Arc<MatchingConfig>,
}

#[utoipa::path(
    post,
    path = "/api/v1/parking/events",
    tag = "Parking",
    request_body = ParkingEventRequest,
    responses(
        (status = 200, description = "Vehicle checked in or checked out", body = ParkingEventResponse),
        (status = 202, description = "Check-out waits for owner confirmation", body = ParkingEventResponse),
        (status = 404, description = "No registered plate within tolerance", body = ParkingEventResponse),
        (status = 409, description = "Ambiguous match or concurrent check-in", body = ParkingEventResponse),
        (status = 422, description = "Unusable plate text", body = ParkingEventResponse)
    )
)]
pub async fn record_event(
    State(state): State<ParkingAppState>,
    ValidatedJson(req): ValidatedJson<ParkingEventRequest>,
) -> (StatusCode, Json<ParkingEventResponse>) {
    let strategy = match state
        .matching
        .strategy(req.strategy, req.threshold_or_max_distance)
    {
        Ok(strategy) => strategy,
        Err(e) => return (status_for(&e), Json(ParkingEventResponse::from_error(e))),
    };
    let mut event = ParkingEvent::new(req.ocr_plate_text, strategy);
    event.confidence = req.confidence;
    event.image_ref = req.image_ref;

    match state.service.record_event(event).await {
        Ok(outcome) => {
            let status = match outcome {
                EventOutcome::PendingConfirmation { .. } => StatusCode::ACCEPTED,
                _ => StatusCode::OK,
            };
            (status, Json(ParkingEventResponse::from_outcome(outcome)))
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!(error = %e, "Failed to record parking event");
            }
            (status, Json(ParkingEventResponse::from_error(e)))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/parking/confirm-check-out",
    tag = "Parking",
    request_body = ConfirmCheckOutRequest,
    responses(
        (status = 200, description = "Check-out confirmed", body = ApiResponse<ParkingSessionDto>),
        (status = 404, description = "No open session for this vehicle and user"),
        (status = 422, description = "Neither vehicle_id nor license_plate given")
    )
)]
pub async fn confirm_check_out(
    State(state): State<ParkingAppState>,
    ValidatedJson(req): ValidatedJson<ConfirmCheckOutRequest>,
) -> Result<Json<ApiResponse<ParkingSessionDto>>, ApiError> {
    let result = match (req.vehicle_id, req.license_plate.as_deref()) {
        (Some(vehicle_id), _) => {
            state
                .service
                .confirm_pending_checkout(vehicle_id, req.user_id)
                .await
        }
        (None, Some(plate)) => {
            state
                .service
                .confirm_checkout_for_plate(plate, req.user_id)
                .await
        }
        (None, None) => {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::error("vehicle_id or license_plate is required")),
            ))
        }
    };

    let session = result.map_err(api_error)?;
    Ok(Json(ApiResponse::success(ParkingSessionDto::from_domain(
        session,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/parking/sessions/{id}",
    tag = "Parking",
    params(("id" = i32, Path, description = "Parking session ID")),
    responses(
        (status = 200, description = "Session details", body = ApiResponse<SessionDetailsDto>),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<ParkingAppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<SessionDetailsDto>>, ApiError> {
    let details = state.service.session_details(id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(SessionDetailsDto::from_domain(
        details,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/parking-sessions",
    tag = "Parking",
    params(
        ("user_id" = i32, Path, description = "Vehicle owner ID"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Parking history, newest first", body = PaginatedResponse<ParkingSessionDto>)
    )
)]
pub async fn list_user_sessions(
    State(state): State<ParkingAppState>,
    Path(user_id): Path<i32>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<ParkingSessionDto>>, ApiError> {
    let page = state
        .service
        .list_user_sessions(user_id, pagination.into())
        .await
        .map_err(api_error)?;
    Ok(Json(page.map(ParkingSessionDto::from_domain).into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/parking/statistics",
    tag = "Parking",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Session counts and check-in distributions", body = ApiResponse<ParkingStatisticsDto>),
        (status = 422, description = "date_from is after date_to")
    )
)]
pub async fn get_statistics(
    State(state): State<ParkingAppState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<ApiResponse<ParkingStatisticsDto>>, ApiError> {
    let range = query.range().map_err(api_error)?;
    let stats = state.service.statistics(range).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(stats.into())))
}
