//! # OneBot Runtime
//!
//! Host-side pieces for applications built on `onebot-codec`:
//!
//! - **Configuration**: defaults, an optional TOML/YAML file and `ONEBOT_*`
//!   environment variables, merged with figment ([`config`])
//! - **Logging**: a `tracing-subscriber` setup driven by that configuration
//!   ([`logging`])
//! - **Echo correlation**: a table matching replies to the actions that
//!   requested them ([`PendingEchoes`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use onebot_runtime::{PendingEchoes, codec_from_config, config, logging};
//!
//! let config = config::load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! let codec = codec_from_config(&config);
//! let pending = PendingEchoes::from_config(&config.correlation);
//!
//! let action = codec.action("get_status", serde_json::json!({}), true, None)?;
//! let reply = pending.register(&action)?;
//! // transport.send(action.to_json_string()?) ...
//! // on every inbound reply: pending.resolve_value(&codec, raw)?;
//! let echo = reply.wait().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pending;

pub use config::{ConfigError, ConfigLoader, RuntimeConfig, load_config};
pub use error::{CorrelationError, CorrelationResult};
pub use pending::{PendingEcho, PendingEchoes};

/// Builds a codec from the `codec` section of a loaded configuration.
pub fn codec_from_config(config: &RuntimeConfig) -> onebot_codec::Codec {
    onebot_codec::Codec::builder()
        .config(config.codec.clone())
        .build()
}
