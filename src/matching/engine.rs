//! Plate match engine
//!
//! Reconciles OCR plate text against the registry. Three strategies:
//!
//! - **Exact**: normalized equality lookup.
//! - **Threshold**: the single plate with the highest similarity ratio at or
//!   above a threshold. Never reports ambiguity. On equal maximal similarity
//!   the plate with the lowest vehicle ID wins, so the pick does not depend on
//!   the order the registry returns rows in.
//! - **Bounded distance**: every plate at the global minimum edit distance is
//!   kept. One plate at the minimum is a unique match; two or more is an
//!   ambiguous match that has to be resolved by an operator.

use std::sync::Arc;

use tracing::{debug, info};

use super::distance::{distance_ratio, levenshtein};
use super::normalizer::normalize;
use crate::domain::{DomainError, DomainResult, Plate, RepositoryProvider};

/// How OCR text is reconciled against the registry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchStrategy {
    Exact,
    /// Minimum similarity ratio in `[0, 1]`
    Threshold(f64),
    /// Maximum accepted edit distance
    BoundedDistance(usize),
}

impl MatchStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Threshold(_) => "threshold",
            Self::BoundedDistance(_) => "bounded-distance",
        }
    }
}

/// Which part of the registry the bounded-distance strategy scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanScope {
    Full,
    /// Only plates sharing the input's first normalized character
    #[default]
    SharedFirstChar,
}

/// A registry plate scored against one input
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub plate: Plate,
    pub distance: usize,
    /// `distance / max(len(input), len(plate))`
    pub ratio: f64,
}

impl MatchCandidate {
    pub fn score(input: &str, plate: &Plate) -> Self {
        let distance = levenshtein(input, plate.normalized_plate());
        let ratio = distance_ratio(distance, input, plate.normalized_plate());
        Self {
            plate: plate.clone(),
            distance,
            ratio,
        }
    }

    pub fn similarity(&self) -> f64 {
        1.0 - self.ratio
    }
}

/// Outcome of one match attempt
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// Nothing within tolerance. `closest_distance` is `None` when no plate
    /// was scanned at all.
    NoMatch { closest_distance: Option<usize> },
    UniqueMatch(MatchCandidate),
    /// Two or more plates tied at the minimum distance, ordered by ID
    AmbiguousMatch { candidates: Vec<Plate>, distance: usize },
}

impl MatchResult {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoMatch { .. } => "no_match",
            Self::UniqueMatch(_) => "unique",
            Self::AmbiguousMatch { .. } => "ambiguous",
        }
    }

    /// Turn anything other than a unique match into the matching error.
    pub fn into_unique(self) -> DomainResult<MatchCandidate> {
        match self {
            Self::UniqueMatch(candidate) => Ok(candidate),
            Self::NoMatch { closest_distance } => {
                Err(DomainError::VehicleNotFound { closest_distance })
            }
            Self::AmbiguousMatch {
                candidates,
                distance,
            } => Err(DomainError::AmbiguousMatch {
                candidates,
                distance,
            }),
        }
    }
}

/// Matchable plates in ascending ID order.
fn ordered(plates: &[Plate]) -> Vec<&Plate> {
    let mut ordered: Vec<&Plate> = plates.iter().filter(|p| p.is_matchable()).collect();
    ordered.sort_by_key(|p| p.id);
    ordered
}

/// Threshold strategy over a registry snapshot. `input` must be normalized.
pub fn best_above_threshold(input: &str, plates: &[Plate], threshold: f64) -> MatchResult {
    let mut best: Option<MatchCandidate> = None;
    let mut closest: Option<usize> = None;

    for plate in ordered(plates) {
        let candidate = MatchCandidate::score(input, plate);
        closest = Some(closest.map_or(candidate.distance, |c| c.min(candidate.distance)));

        let beats_best = best
            .as_ref()
            .map_or(true, |b| candidate.similarity() > b.similarity());
        if candidate.similarity() >= threshold && beats_best {
            best = Some(candidate);
        }
    }

    match best {
        Some(candidate) => MatchResult::UniqueMatch(candidate),
        None => MatchResult::NoMatch {
            closest_distance: closest,
        },
    }
}

/// Bounded-distance strategy over a registry snapshot. `input` must be
/// normalized.
pub fn within_distance(input: &str, plates: &[Plate], max_distance: usize) -> MatchResult {
    let mut min_distance = usize::MAX;
    let mut tied: Vec<MatchCandidate> = Vec::new();

    for plate in ordered(plates) {
        let candidate = MatchCandidate::score(input, plate);
        if candidate.distance < min_distance {
            min_distance = candidate.distance;
            tied.clear();
            tied.push(candidate);
        } else if candidate.distance == min_distance {
            tied.push(candidate);
        }
    }

    if tied.is_empty() {
        return MatchResult::NoMatch {
            closest_distance: None,
        };
    }
    if min_distance > max_distance {
        return MatchResult::NoMatch {
            closest_distance: Some(min_distance),
        };
    }
    if tied.len() == 1 {
        return MatchResult::UniqueMatch(tied.remove(0));
    }
    MatchResult::AmbiguousMatch {
        candidates: tied.into_iter().map(|c| c.plate).collect(),
        distance: min_distance,
    }
}

/// Runs match strategies against the plate registry.
#[derive(Clone)]
pub struct MatchEngine {
    repos: Arc<dyn RepositoryProvider>,
    scope: ScanScope,
}

impl MatchEngine {
    pub fn new(repos: Arc<dyn RepositoryProvider>, scope: ScanScope) -> Self {
        Self { repos, scope }
    }

    /// Normalize `ocr_text` and run `strategy`.
    ///
    /// Fails with `InvalidInput` when nothing usable is left after
    /// normalization; in that case the registry is not read.
    pub async fn find(&self, ocr_text: &str, strategy: MatchStrategy) -> DomainResult<MatchResult> {
        let input = normalize(ocr_text);
        if input.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "plate text {:?} has no letters or digits",
                ocr_text
            )));
        }

        let result = match strategy {
            MatchStrategy::Exact => self.exact(&input).await?,
            MatchStrategy::Threshold(threshold) => {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(DomainError::Validation(format!(
                        "similarity threshold must be within [0, 1], got {}",
                        threshold
                    )));
                }
                let plates = self.repos.plates().list_plates().await?;
                best_above_threshold(&input, &plates, threshold)
            }
            MatchStrategy::BoundedDistance(max_distance) => {
                let plates = self.snapshot(&input).await?;
                within_distance(&input, &plates, max_distance)
            }
        };

        metrics::counter!(
            "plate_matches_total",
            "strategy" => strategy.name(),
            "result" => result.kind()
        )
        .increment(1);

        match &result {
            MatchResult::UniqueMatch(c) => info!(
                ocr = ocr_text,
                normalized = input.as_str(),
                strategy = strategy.name(),
                matched = c.plate.raw_plate(),
                vehicle_id = c.plate.id,
                distance = c.distance,
                similarity = c.similarity(),
                "License plate matched"
            ),
            MatchResult::AmbiguousMatch {
                candidates,
                distance,
            } => info!(
                ocr = ocr_text,
                normalized = input.as_str(),
                strategy = strategy.name(),
                candidates = candidates.len(),
                distance,
                "License plate match is ambiguous"
            ),
            MatchResult::NoMatch { closest_distance } => info!(
                ocr = ocr_text,
                normalized = input.as_str(),
                strategy = strategy.name(),
                closest_distance = ?closest_distance,
                "No license plate matched"
            ),
        }

        Ok(result)
    }

    pub async fn find_exact(&self, ocr_text: &str) -> DomainResult<MatchResult> {
        self.find(ocr_text, MatchStrategy::Exact).await
    }

    pub async fn find_best_above_threshold(
        &self,
        ocr_text: &str,
        threshold: f64,
    ) -> DomainResult<MatchResult> {
        self.find(ocr_text, MatchStrategy::Threshold(threshold)).await
    }

    pub async fn find_within_distance(
        &self,
        ocr_text: &str,
        max_distance: usize,
    ) -> DomainResult<MatchResult> {
        self.find(ocr_text, MatchStrategy::BoundedDistance(max_distance))
            .await
    }

    async fn exact(&self, input: &str) -> DomainResult<MatchResult> {
        Ok(match self.repos.plates().find_exact(input).await? {
            Some(plate) => MatchResult::UniqueMatch(MatchCandidate {
                plate,
                distance: 0,
                ratio: 0.0,
            }),
            None => MatchResult::NoMatch {
                closest_distance: None,
            },
        })
    }

    async fn snapshot(&self, input: &str) -> DomainResult<Vec<Plate>> {
        let plates = match (self.scope, input.chars().next()) {
            (ScanScope::SharedFirstChar, Some(first)) => {
                self.repos.plates().list_by_first_char(first).await?
            }
            _ => self.repos.plates().list_plates().await?,
        };
        debug!(scope = ?self.scope, scanned = plates.len(), "Registry snapshot loaded");
        Ok(plates)
    }
}
