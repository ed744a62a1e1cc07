pub mod app_config;
pub mod channel;
pub mod config;
pub mod records;
pub mod warehouses;

pub use app_config::AppConfig;
pub use channel::{ChannelPolicy, ConflictLabel, Precedence};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{NormalizedRecord, OrderChannel, SNAPSHOT_COLUMNS};
pub use warehouses::{load_catalog, CatalogFile, WarehouseConfig, WarehouseContext};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read warehouse catalog {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse warehouse catalog: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("warehouse catalog validation failed: {0}")]
    Validation(String),
}
