pub mod app_config;
pub mod config;
pub mod listing;
pub mod registry;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use listing::{listing_fingerprint, ArtifactFile, CountryArtifact, ListingRecord};
pub use registry::{builtin_targets, load_countries, PaginationStrategy, StorefrontTarget};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read countries file {path}: {source}")]
    CountriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse countries file: {0}")]
    CountriesFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
