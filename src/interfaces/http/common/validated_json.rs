//! JSON body extractor with `validator` checks.
//!
//! Malformed JSON is rejected with 400, failed field rules with 422. The
//! body of the rejection is chosen by the request type through
//! [`RejectionBody`], so an endpoint with its own response contract (the
//! camera event endpoint answers with an `outcome` tag) keeps that shape
//! even when extraction fails.

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

/// Renders extraction failures for a request type.
///
/// The default is the `ApiResponse` error envelope.
pub trait RejectionBody {
    fn rejection(status: StatusCode, message: String) -> Response {
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// `axum::Json<T>` followed by `T::validate()`.
pub struct ValidatedJson<T>(pub T);

/// One `field: problem` entry per failed rule, fields in name order.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let parts: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();

    if parts.is_empty() {
        "Validation failed".to_string()
    } else {
        parts.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + RejectionBody,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            T::rejection(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", rejection))
        })?;

        value
            .validate()
            .map_err(|errors| T::rejection(StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::post;
    use axum::Router;
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Lookup {
        #[validate(length(min = 1, max = 20))]
        license_plate: String,
        #[validate(range(min = 0.0, max = 1.0))]
        confidence: f64,
    }

    impl RejectionBody for Lookup {}

    /// Answers failures with a bare `{"reason": ...}` object.
    #[derive(Debug, Deserialize, Validate)]
    struct Reading {
        #[validate(length(min = 1))]
        text: String,
    }

    impl RejectionBody for Reading {
        fn rejection(status: StatusCode, message: String) -> Response {
            (status, Json(serde_json::json!({ "reason": message }))).into_response()
        }
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/lookup",
                post(|ValidatedJson(_b): ValidatedJson<Lookup>| async { "ok" }),
            )
            .route(
                "/reading",
                post(|ValidatedJson(_b): ValidatedJson<Reading>| async { "ok" }),
            )
    }

    async fn post_raw(uri: &str, body: impl Into<Body>) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn post_json(uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        post_raw(uri, serde_json::to_vec(&body).unwrap()).await
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let (status, _) = post_json(
            "/lookup",
            serde_json::json!({"license_plate": "B 1234 XYZ", "confidence": 0.93}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400_in_envelope() {
        let (status, body) = post_raw("/lookup", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn missing_field_is_400() {
        let (status, _) = post_json("/lookup", serde_json::json!({"confidence": 0.5})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_rules_list_every_field_in_order() {
        let (status, body) = post_json(
            "/lookup",
            serde_json::json!({"license_plate": "B1234XYZB1234XYZB1234", "confidence": 1.5}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error = body["error"].as_str().unwrap();
        let confidence = error.find("confidence").unwrap();
        let plate = error.find("license_plate").unwrap();
        assert!(confidence < plate);
    }

    #[tokio::test]
    async fn request_type_chooses_rejection_shape() {
        let (status, body) = post_json("/reading", serde_json::json!({"text": ""})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["reason"].as_str().unwrap().starts_with("text:"));
        assert!(body.get("success").is_none());
    }
}
