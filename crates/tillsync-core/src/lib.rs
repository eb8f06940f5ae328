//! Shared configuration and domain types for tillsync.
//!
//! Holds the environment-driven [`AppConfig`], the shop roster loaded from
//! `config/shops.yaml`, and the manual/scheduled date-window policy. No I/O
//! beyond reading env vars and the roster file at startup.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod shops;
pub mod window;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use shops::{load_shops, ShopConfig, ShopsFile};
pub use window::{resolve_window, DateWindow, SyncMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read shops file at {path}: {source}")]
    ShopsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse shops file: {0}")]
    ShopsFileParse(#[from] serde_yaml::Error),

    #[error("shops file validation failed: {0}")]
    Validation(String),
}
