//! Layered configuration for hosts of the codec.
//!
//! Defaults, an optional TOML/YAML file and `ONEBOT_*` environment variables
//! are merged with figment, then validated.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, load_config};
pub use schema::{
    CorrelationConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, RuntimeConfig,
};
pub use validation::validate_config;
