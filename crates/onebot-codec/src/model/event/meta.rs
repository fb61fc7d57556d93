//! Meta Events
//!
//! # Hierarchy
//!
//! ```text
//! MetaEvent { time, self_id, kind: MetaEventKind }
//! └── MetaEventKind (meta_event_type dispatch)
//!     ├── Lifecycle(LifecycleEvent)
//!     ├── Heartbeat(HeartbeatEvent)
//!     └── Other(UnknownKind)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{UnknownKind, discriminator, leaf};
use crate::error::CodecResult;
use crate::model::flex;

// ============================================================================
// MetaEvent - Container for meta events
// ============================================================================

/// Meta event container.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaEvent {
    /// Unix timestamp.
    pub time: i64,
    /// Bot's QQ ID.
    pub self_id: i64,
    /// The specific meta event kind.
    pub kind: MetaEventKind,
}

/// Meta event kind dispatch based on `meta_event_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaEventKind {
    /// Lifecycle event.
    Lifecycle(LifecycleEvent),
    /// Heartbeat event.
    Heartbeat(HeartbeatEvent),
    /// Any other `meta_event_type`.
    Other(UnknownKind),
}

pub(crate) fn decode(raw: Value) -> CodecResult<MetaEventKind> {
    let meta_event_type = discriminator(&raw, "meta_event_type")?.to_string();
    Ok(match meta_event_type.as_str() {
        "lifecycle" => MetaEventKind::Lifecycle(leaf("meta_event lifecycle", raw)?),
        "heartbeat" => MetaEventKind::Heartbeat(leaf("meta_event heartbeat", raw)?),
        other => MetaEventKind::Other(UnknownKind::new(other, raw)),
    })
}

// ============================================================================
// LifecycleEvent
// ============================================================================

/// Lifecycle event (connect/disconnect).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Sub-type ("enable", "disable", "connect").
    pub sub_type: String,
}

// ============================================================================
// HeartbeatEvent
// ============================================================================

/// Heartbeat status info.
///
/// Implementations report arbitrary extra fields; they are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatStatus {
    /// App initialized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_initialized: Option<bool>,
    /// App enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_enabled: Option<bool>,
    /// App good.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_good: Option<bool>,
    /// Online status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    /// Good status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub good: Option<bool>,
    /// Additional status fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Heartbeat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    /// Status information.
    #[serde(default)]
    pub status: HeartbeatStatus,
    /// Heartbeat interval in milliseconds.
    #[serde(default, deserialize_with = "flex::opt_int")]
    pub interval: Option<i64>,
}
