//! Domain types, geodesy, and configuration for the poisweep workspace.

pub mod anchors;
pub mod app_config;
mod config;
pub mod geo;
pub mod types;

pub use anchors::{load_anchors, AnchorConfig, AnchorsFile};
pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{distance_km, GeoError, EARTH_RADIUS_KM};
pub use types::{
    Anchor, AnchorOutcome, AnchorStatus, PoiRecord, ResultSet, SearchHistoryEntry,
};

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read anchors file {path}: {source}")]
    AnchorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse anchors file: {0}")]
    AnchorsFileParse(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
