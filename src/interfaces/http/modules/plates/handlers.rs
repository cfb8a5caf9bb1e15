//! Plate API handlers

use axum::{
    extract::{Path, State},
    Json,
};

use super::dto::{PlateStatusResponse, VerifyPlateRequest, VerifyPlateResponse};
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::modules::parking::ParkingAppState;

#[utoipa::path(
    post,
    path = "/api/v1/plates/verify",
    tag = "Plates",
    request_body = VerifyPlateRequest,
    responses(
        (status = 200, description = "Match result", body = ApiResponse<VerifyPlateResponse>),
        (status = 422, description = "Unusable plate text")
    )
)]
pub async fn verify_plate(
    State(state): State<ParkingAppState>,
    ValidatedJson(req): ValidatedJson<VerifyPlateRequest>,
) -> Result<Json<ApiResponse<VerifyPlateResponse>>, ApiError> {
    let strategy = state
        .matching
        .strategy(req.strategy, req.threshold_or_max_distance)
        .map_err(api_error)?;
    let result = state
        .service
        .verify_plate(&req.license_plate, strategy)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(VerifyPlateResponse::from_result(
        result,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/plates/{plate}/status",
    tag = "Plates",
    params(("plate" = String, Path, description = "License plate, any spacing or case")),
    responses(
        (status = 200, description = "Whether the vehicle is parked", body = ApiResponse<PlateStatusResponse>),
        (status = 404, description = "Plate not registered")
    )
)]
pub async fn plate_status(
    State(state): State<ParkingAppState>,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<PlateStatusResponse>>, ApiError> {
    let is_checked_in = state
        .service
        .is_checked_in(&plate)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(PlateStatusResponse {
        license_plate: plate,
        is_checked_in,
    })))
}
