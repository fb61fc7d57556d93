//! Error types for the OneBot v11 codec.
//!
//! Every encode/decode operation reports failure as a [`CodecError`]. None of
//! them are fatal to a connection: the caller decides whether to drop the
//! single offending message or escalate.

use thiserror::Error;

/// Errors produced by the segment registry and the action/echo/event codecs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A payload's shape does not match the schema for its discriminator.
    #[error("schema violation in {context}: {reason}")]
    SchemaViolation {
        /// What was being decoded (e.g. `segment 'image'`, `echo get_status`).
        context: String,
        /// Missing, extra or mistyped field description.
        reason: String,
    },

    /// A segment discriminator is absent from the registry.
    #[error("unknown segment kind '{kind}'")]
    UnknownSegmentKind {
        /// The unrecognised discriminator.
        kind: String,
    },

    /// A registry extension call was given a malformed description.
    #[error("invalid variant spec for '{kind}': {reason}")]
    InvalidVariantSpec {
        /// The discriminator the caller tried to register.
        kind: String,
        /// Why the registration was refused.
        reason: String,
    },

    /// A malformed inline (`[CQ:...]`) string.
    #[error("inline parse error at byte {position}: {reason}")]
    ParseError {
        /// Byte offset into the inline string where parsing failed.
        position: usize,
        /// Description of the malformation.
        reason: String,
    },

    /// Raw text was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(String),
}

impl CodecError {
    /// Creates a schema violation error.
    pub fn schema(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::SchemaViolation {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid variant spec error.
    pub fn invalid_spec(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVariantSpec {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Creates an inline parse error.
    pub fn parse(position: usize, reason: impl Into<String>) -> Self {
        Self::ParseError {
            position,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error only concerns one message and the
    /// connection carrying it can keep going.
    pub fn is_message_local(&self) -> bool {
        !matches!(self, CodecError::InvalidVariantSpec { .. })
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
