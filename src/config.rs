//! Application configuration
//!
//! Loaded from a TOML file. The path is, in order of preference, the one
//! given on the command line, `$PARKING_CONFIG`, or
//! `<config dir>/parking-lpr/config.toml`. Every key has a default, so an
//! empty or missing file yields a working setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::{DomainError, DomainResult};
use crate::matching::{normalize, MatchStrategy, ScanScope};

pub const CONFIG_ENV: &str = "PARKING_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parking-lpr")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub matching: MatchingConfig,
    pub parking: ParkingConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Full connection URL; takes precedence over `sqlite_path`
    pub url: Option<String>,
    pub sqlite_path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            sqlite_path: "./parking.db".to_string(),
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.sqlite_path),
        }
    }
}

/// Matching strategy as named in config files and requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyName {
    Exact,
    Threshold,
    BoundedDistance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Strategy used when a request does not name one
    pub default_strategy: StrategyName,
    pub similarity_threshold: f64,
    pub max_distance: usize,
    /// Bounded-distance scans only plates sharing the first character
    pub prefix_filter: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_strategy: StrategyName::BoundedDistance,
            similarity_threshold: 0.7,
            max_distance: 2,
            prefix_filter: true,
        }
    }
}

impl MatchingConfig {
    /// Build a strategy, taking the tolerance from config unless given.
    ///
    /// A threshold must lie in `[0, 1]`; a distance must be a
    /// non-negative whole number.
    pub fn strategy(
        &self,
        name: Option<StrategyName>,
        tolerance: Option<f64>,
    ) -> DomainResult<MatchStrategy> {
        match name.unwrap_or(self.default_strategy) {
            StrategyName::Exact => Ok(MatchStrategy::Exact),
            StrategyName::Threshold => {
                let threshold = tolerance.unwrap_or(self.similarity_threshold);
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(DomainError::Validation(format!(
                        "similarity threshold must be within [0, 1], got {}",
                        threshold
                    )));
                }
                Ok(MatchStrategy::Threshold(threshold))
            }
            StrategyName::BoundedDistance => match tolerance {
                None => Ok(MatchStrategy::BoundedDistance(self.max_distance)),
                Some(t) if t.is_finite() && t >= 0.0 && t.fract() == 0.0 => {
                    Ok(MatchStrategy::BoundedDistance(t as usize))
                }
                Some(t) => Err(DomainError::Validation(format!(
                    "max distance must be a non-negative integer, got {}",
                    t
                ))),
            },
        }
    }

    pub fn scan_scope(&self) -> ScanScope {
        if self.prefix_filter {
            ScanScope::SharedFirstChar
        } else {
            ScanScope::Full
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// Open sessions older than this are reported as expired
    pub expiry_hours: i64,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self { expiry_hours: 24 }
    }
}

/// A vehicle registered at startup.
///
/// ```toml
/// [[registry.plates]]
/// license_plate = "B 1234 XYZ"
/// owner_id = 10
/// name = "Blue Avanza"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateSeed {
    pub license_plate: String,
    pub owner_id: i32,
    pub name: Option<String>,
}

/// Vehicles loaded into the registry on every start. Entries already
/// present (same normalized plate) are updated in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub plates: Vec<PlateSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.api_port == 0 {
            return Err(ConfigError::Invalid("server.api_port must not be 0".into()));
        }
        let t = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::Invalid(format!(
                "matching.similarity_threshold must be within [0, 1], got {}",
                t
            )));
        }
        if self.parking.expiry_hours <= 0 {
            return Err(ConfigError::Invalid(
                "parking.expiry_hours must be positive".into(),
            ));
        }
        if let Some(seed) = self
            .registry
            .plates
            .iter()
            .find(|p| normalize(&p.license_plate).is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "registry plate {:?} has no letters or digits",
                seed.license_plate
            )));
        }
        Ok(())
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.api_host, self.server.api_port)
    }
}
