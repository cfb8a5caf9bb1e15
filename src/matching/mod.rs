//! License-plate matching core
//!
//! - [`normalizer`]: canonical plate text
//! - [`distance`]: Levenshtein distance and similarity ratio
//! - [`engine`]: strategies that reconcile OCR text against the registry

pub mod distance;
pub mod engine;
pub mod normalizer;

pub use distance::{distance_ratio, levenshtein, similarity_ratio};
pub use engine::{
    best_above_threshold, within_distance, MatchCandidate, MatchEngine, MatchResult,
    MatchStrategy, ScanScope,
};
pub use normalizer::normalize;
