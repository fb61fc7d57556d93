//! Codec configuration.
//!
//! Loaded as the `codec` section of the host configuration file:
//!
//! ```yaml
//! codec:
//!   unknown_segment: pass_through
//!   coerce_inline_numbers: true
//! ```

use serde::{Deserialize, Serialize};

/// What to do with a segment whose discriminator is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownSegmentPolicy {
    /// Fail the containing message with `UnknownSegmentKind`.
    #[default]
    Reject,
    /// Keep the segment as an opaque value that re-encodes unchanged.
    PassThrough,
}

/// Codec behaviour switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Policy for unregistered segment kinds.
    pub unknown_segment: UnknownSegmentPolicy,
    /// Coerce numeric-looking inline field values into JSON numbers.
    pub coerce_inline_numbers: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            unknown_segment: UnknownSegmentPolicy::Reject,
            coerce_inline_numbers: true,
        }
    }
}

impl CodecConfig {
    /// Returns a config that passes unknown segment kinds through.
    pub fn lenient() -> Self {
        Self {
            unknown_segment: UnknownSegmentPolicy::PassThrough,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: CodecConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.unknown_segment, UnknownSegmentPolicy::Reject);
        assert!(config.coerce_inline_numbers);
    }

    #[test]
    fn test_policy_names() {
        let config: CodecConfig =
            serde_json::from_str(r#"{"unknown_segment":"pass_through"}"#).unwrap();
        assert_eq!(config, CodecConfig::lenient());
    }
}
