//! Application configuration module
//!
//! Configuration is loaded from environment variables with the
//! `HUNTRED_FLOW` prefix; nested values use double underscores as
//! separators. Every section has defaults, so an empty environment yields
//! an in-memory development setup.
//!
//! # Example
//!
//! ```no_run
//! use huntred_flow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod delivery;
mod engine;
mod error;
mod server;
mod storage;

pub use delivery::DeliveryConfig;
pub use engine::{EngineConfig, FlowsConfig};
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, LogFormat, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging, request signing)
    #[serde(default)]
    pub server: ServerConfig,

    /// Conversation store backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Flow catalog location
    #[serde(default)]
    pub flows: FlowsConfig,

    /// Turn processing behaviour
    #[serde(default)]
    pub engine: EngineConfig,

    /// Outbound channel delivery
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `HUNTRED_FLOW__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `HUNTRED_FLOW__STORAGE__BACKEND=postgres` -> `storage.backend`
    ///
    /// A `.env` file is read first when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("HUNTRED_FLOW")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.storage.validate()?;
        self.delivery.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
