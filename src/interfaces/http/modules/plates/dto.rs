//! Plate verification DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::config::StrategyName;
use crate::interfaces::http::common::RejectionBody;
use crate::interfaces::http::modules::parking::PlateDto;
use crate::matching::MatchResult;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyPlateRequest {
    #[validate(length(min = 1, max = 20))]
    pub license_plate: String,
    /// Defaults to the configured strategy
    pub strategy: Option<StrategyName>,
    pub threshold_or_max_distance: Option<f64>,
}

impl RejectionBody for VerifyPlateRequest {}

/// Registry lookup result; sessions are not touched
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPlateResponse {
    /// unique, ambiguous or no_match
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<PlateDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub candidates: Vec<PlateDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closest_distance: Option<usize>,
}

impl VerifyPlateResponse {
    pub fn from_result(result: MatchResult) -> Self {
        let mut resp = Self {
            result: result.kind().to_string(),
            plate: None,
            distance: None,
            similarity: None,
            candidates: Vec::new(),
            closest_distance: None,
        };
        match result {
            MatchResult::UniqueMatch(m) => {
                resp.similarity = Some(m.similarity());
                resp.distance = Some(m.distance);
                resp.plate = Some(PlateDto::from_domain(&m.plate));
            }
            MatchResult::AmbiguousMatch {
                candidates,
                distance,
            } => {
                resp.distance = Some(distance);
                resp.candidates = candidates.iter().map(PlateDto::from_domain).collect();
            }
            MatchResult::NoMatch { closest_distance } => {
                resp.closest_distance = closest_distance;
            }
        }
        resp
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlateStatusResponse {
    pub license_plate: String,
    pub is_checked_in: bool,
}
