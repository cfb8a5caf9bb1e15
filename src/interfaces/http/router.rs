//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, PaginatedResponse, PaginationQuery};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::parking::{self, ParkingAppState};
use super::modules::plates;
use crate::application::ParkingService;
use crate::config::{MatchingConfig, StrategyName};

/// State shared by every route. Handlers extract their own slice via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub parking: ParkingAppState,
    pub health: HealthState,
    pub metrics: MetricsState,
}

impl FromRef<ApiState> for ParkingAppState {
    fn from_ref(s: &ApiState) -> Self {
        s.parking.clone()
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        s.health.clone()
    }
}

impl FromRef<ApiState> for MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        s.metrics.clone()
    }
}

impl ApiState {
    pub fn new(
        service: Arc<ParkingService>,
        matching: MatchingConfig,
        db: Option<DatabaseConnection>,
        prometheus: PrometheusHandle,
    ) -> Self {
        Self {
            parking: ParkingAppState {
                service,
                matching: Arc::new(matching),
            },
            health: HealthState {
                db,
                started_at: Arc::new(Instant::now()),
            },
            metrics: MetricsState { handle: prometheus },
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        parking::record_event,
        parking::confirm_check_out,
        parking::get_session,
        parking::list_user_sessions,
        parking::get_statistics,
        plates::verify_plate,
        plates::plate_status,
    ),
    components(
        schemas(
            ApiResponse<String>,
            PaginatedResponse<parking::ParkingSessionDto>,
            PaginationQuery,
            StrategyName,
            health::HealthResponse,
            health::ComponentHealth,
            parking::ParkingEventRequest,
            parking::ParkingEventResponse,
            parking::ConfirmCheckOutRequest,
            parking::PlateDto,
            parking::ParkingSessionDto,
            parking::SessionDetailsDto,
            parking::SessionDurationDto,
            parking::ParkingStatisticsDto,
            parking::DailyCountDto,
            parking::UserCountDto,
            parking::StatisticsQuery,
            plates::VerifyPlateRequest,
            plates::VerifyPlateResponse,
            plates::PlateStatusResponse,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Parking", description = "Camera events, check-out confirmation and parking history"),
        (name = "Plates", description = "License plate lookup against the vehicle registry"),
    ),
    info(
        title = "Parking LPR API",
        version = "1.0.0",
        description = "Vehicle check-in/check-out tracking from license plate recognition",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let parking_routes = Router::new()
        .route("/events", post(parking::record_event))
        .route("/confirm-check-out", post(parking::confirm_check_out))
        .route("/sessions/{id}", get(parking::get_session))
        .route("/statistics", get(parking::get_statistics));

    let plate_routes = Router::new()
        .route("/verify", post(plates::verify_plate))
        .route("/{plate}/status", get(plates::plate_status));

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api/v1/parking", parking_routes)
        .nest("/api/v1/plates", plate_routes)
        .route(
            "/api/v1/users/{user_id}/parking-sessions",
            get(parking::list_user_sessions),
        )
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
