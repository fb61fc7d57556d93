//! Request Events
//!
//! # Hierarchy
//!
//! ```text
//! RequestEvent { time, self_id, kind: RequestKind }
//! └── RequestKind (request_type dispatch)
//!     ├── Friend(FriendRequestEvent { user_id, comment, flag })
//!     ├── Group(GroupRequestEvent  { group_id, user_id, comment, flag, sub_type })
//!     └── Other(UnknownKind)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{UnknownKind, discriminator, leaf};
use crate::error::CodecResult;
use crate::model::flex;

// ============================================================================
// RequestEvent
// ============================================================================

/// Request event container.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEvent {
    /// Unix timestamp.
    pub time: i64,
    /// Bot's QQ ID.
    pub self_id: i64,
    /// The specific request kind.
    pub kind: RequestKind,
}

impl RequestEvent {
    /// Returns the flag used to answer this request, if any.
    pub fn flag(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::Friend(e) => Some(&e.flag),
            RequestKind::Group(e) => Some(&e.flag),
            RequestKind::Other(e) => e.fields.get("flag").and_then(Value::as_str),
        }
    }
}

/// Request kind dispatch based on `request_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    /// Friend request.
    Friend(FriendRequestEvent),
    /// Group join request or invitation.
    Group(GroupRequestEvent),
    /// Any other `request_type`.
    Other(UnknownKind),
}

/// Friend request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendRequestEvent {
    /// Requesting user.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// Verification message.
    #[serde(default)]
    pub comment: String,
    /// Flag to pass back when answering.
    pub flag: String,
}

/// Group join request or invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRequestEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// Requesting user.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// Verification message.
    #[serde(default)]
    pub comment: String,
    /// Flag to pass back when answering.
    pub flag: String,
    /// Sub-type ("add", "invite").
    pub sub_type: String,
}

pub(crate) fn decode(raw: Value) -> CodecResult<RequestKind> {
    let request_type = discriminator(&raw, "request_type")?.to_string();
    Ok(match request_type.as_str() {
        "friend" => RequestKind::Friend(leaf("request friend", raw)?),
        "group" => RequestKind::Group(leaf("request group", raw)?),
        other => RequestKind::Other(UnknownKind::new(other, raw)),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_group_request() {
        let kind = decode(json!({
            "request_type": "group", "sub_type": "invite",
            "group_id": 1, "user_id": 2, "flag": "f"
        }))
        .unwrap();
        let RequestKind::Group(group) = kind else {
            panic!("expected group request")
        };
        assert_eq!(group.comment, "");
        assert_eq!(group.sub_type, "invite");
    }

    #[test]
    fn test_missing_flag() {
        assert!(decode(json!({"request_type": "friend", "user_id": 2})).is_err());
    }
}
