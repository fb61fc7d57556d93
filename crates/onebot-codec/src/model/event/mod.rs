//! OneBot v11 Event decoding.
//!
//! Inbound notifications are dispatched on `post_type`, then on the
//! kind-specific discriminator, into a tree of sum types:
//!
//! ```text
//! Event { time, self_id }                                     ← post_type
//! ├── Message(MessageEvent { message_type, sub_type, message, sender, … })
//! ├── Notice(NoticeEvent { kind: NoticeKind })                ← notice_type
//! │   ├── GroupUpload, GroupAdmin, … , Essence
//! │   ├── Notify(NotifyEvent { kind: NotifyKind })            ← sub_type
//! │   │   └── Poke, LuckyKing, Honor, Other
//! │   └── Other
//! ├── Request(RequestEvent { kind: RequestKind })             ← request_type
//! │   └── Friend, Group, Other
//! └── Meta(MetaEvent { kind: MetaEventKind })                 ← meta_event_type
//!     └── Lifecycle, Heartbeat, Other
//! ```
//!
//! An unknown `post_type` is a schema violation. Unknown discriminators
//! below the top level decode as an `Other` variant carrying the raw fields,
//! so a server that adds a notice type does not break the connection.
//!
//! # Example
//!
//! ```rust
//! use onebot_codec::{CodecConfig, Event, SegmentRegistry};
//! use onebot_codec::model::event::decode_event;
//! use serde_json::json;
//!
//! let raw = json!({
//!     "time": 1, "self_id": 1, "post_type": "message",
//!     "message_type": "private", "sub_type": "friend",
//!     "message_id": 5, "user_id": 9, "message": "hi", "sender": {}
//! });
//! let event = decode_event(&SegmentRegistry::new(), &CodecConfig::default(), raw).unwrap();
//! let Event::Message(msg) = event else { unreachable!() };
//! assert_eq!(msg.message.plain_text(), "hi");
//! ```

pub mod message;
pub mod meta;
pub mod notice;
pub mod request;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::flex;
use super::from_value;
use super::registry::SegmentRegistry;
use crate::config::CodecConfig;
use crate::context::EventRef;
use crate::error::{CodecError, CodecResult};

pub use message::{MessageEvent, MessageSubType};
pub use meta::{HeartbeatEvent, HeartbeatStatus, LifecycleEvent, MetaEvent, MetaEventKind};
pub use notice::{
    ClientStatusEvent, Device, EssenceEvent, FriendAddEvent, FriendRecallEvent, GroupAdminEvent,
    GroupBanEvent, GroupCardEvent, GroupDecreaseEvent, GroupIncreaseEvent, GroupRecallEvent,
    GroupUploadEvent, HonorEvent, LuckyKingEvent, NoticeEvent, NoticeKind, NotifyEvent,
    NotifyKind, OfflineFile, OfflineFileEvent, PokeEvent, UploadedFile,
};
pub use request::{FriendRequestEvent, GroupRequestEvent, RequestEvent, RequestKind};

// ============================================================================
// Event (Root Level)
// ============================================================================

/// Top-level event discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    /// Message event.
    Message,
    /// Notice event.
    Notice,
    /// Request event.
    Request,
    /// Meta event.
    MetaEvent,
}

impl PostType {
    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Message => "message",
            PostType::Notice => "notice",
            PostType::Request => "request",
            PostType::MetaEvent => "meta_event",
        }
    }
}

/// A decoded OneBot v11 event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `post_type = "message"`.
    Message(MessageEvent),
    /// `post_type = "notice"`.
    Notice(NoticeEvent),
    /// `post_type = "request"`.
    Request(RequestEvent),
    /// `post_type = "meta_event"`.
    Meta(MetaEvent),
}

impl Event {
    /// Unix timestamp when the event occurred.
    pub fn time(&self) -> i64 {
        match self {
            Event::Message(e) => e.time,
            Event::Notice(e) => e.time,
            Event::Request(e) => e.time,
            Event::Meta(e) => e.time,
        }
    }

    /// The reporting bot account.
    pub fn self_id(&self) -> i64 {
        match self {
            Event::Message(e) => e.self_id,
            Event::Notice(e) => e.self_id,
            Event::Request(e) => e.self_id,
            Event::Meta(e) => e.self_id,
        }
    }

    /// The top-level discriminator.
    pub fn post_type(&self) -> PostType {
        match self {
            Event::Message(_) => PostType::Message,
            Event::Notice(_) => PostType::Notice,
            Event::Request(_) => PostType::Request,
            Event::Meta(_) => PostType::MetaEvent,
        }
    }

    /// Builds the causal back-reference stamped on actions sent in reply.
    pub fn to_ref(&self) -> EventRef {
        EventRef {
            time: self.time(),
            self_id: self.self_id(),
            post_type: self.post_type(),
            message_id: match self {
                Event::Message(e) => Some(e.message_id),
                _ => None,
            },
        }
    }
}

/// A sub-discriminator this crate does not model, with its raw fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownKind {
    /// The unrecognised discriminator value.
    pub name: String,
    /// Every field of the envelope.
    pub fields: Map<String, Value>,
}

impl UnknownKind {
    pub(crate) fn new(name: &str, raw: Value) -> Self {
        let fields = match raw {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        Self {
            name: name.to_string(),
            fields,
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

#[derive(Deserialize)]
struct Header {
    #[serde(deserialize_with = "flex::int")]
    time: i64,
    #[serde(deserialize_with = "flex::int")]
    self_id: i64,
    post_type: String,
}

/// Decodes one inbound event envelope.
pub fn decode_event(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    raw: Value,
) -> CodecResult<Event> {
    trace!(raw = %raw, "Decoding event");
    if !raw.is_object() {
        return Err(CodecError::schema("event", "envelope is not an object"));
    }
    let header: Header = Header::deserialize(&raw).map_err(|err| CodecError::schema("event", err))?;

    let event = match header.post_type.as_str() {
        "message" => Event::Message(message::decode(registry, config, raw)?),
        "notice" => Event::Notice(NoticeEvent {
            time: header.time,
            self_id: header.self_id,
            kind: notice::decode(raw)?,
        }),
        "request" => Event::Request(RequestEvent {
            time: header.time,
            self_id: header.self_id,
            kind: request::decode(raw)?,
        }),
        "meta_event" => Event::Meta(MetaEvent {
            time: header.time,
            self_id: header.self_id,
            kind: meta::decode(raw)?,
        }),
        other => {
            return Err(CodecError::schema(
                "event",
                format!("unknown post_type `{other}`"),
            ));
        }
    };
    debug!(post_type = %header.post_type, self_id = header.self_id, "Decoded event");
    Ok(event)
}

/// Reads a string discriminator without consuming the envelope.
pub(crate) fn discriminator<'a>(raw: &'a Value, key: &str) -> CodecResult<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::schema("event", format!("missing string field `{key}`")))
}

pub(crate) fn leaf<T: serde::de::DeserializeOwned>(context: &str, raw: Value) -> CodecResult<T> {
    from_value(format!("event {context}"), raw)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(raw: Value) -> CodecResult<Event> {
        decode_event(&SegmentRegistry::new(), &CodecConfig::default(), raw)
    }

    #[test]
    fn test_header_is_required() {
        let err = decode(json!({"post_type": "notice", "notice_type": "friend_add", "user_id": 1}))
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));

        let err = decode(json!("not an object")).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));
    }

    #[test]
    fn test_unknown_post_type() {
        let err = decode(json!({"time": 1, "self_id": 2, "post_type": "telemetry"})).unwrap_err();
        assert!(matches!(
            err,
            CodecError::SchemaViolation { ref reason, .. } if reason.contains("telemetry")
        ));
    }

    #[test]
    fn test_to_ref() {
        let event = decode(json!({
            "time": 100, "self_id": 2, "post_type": "notice",
            "notice_type": "friend_add", "user_id": 3
        }))
        .unwrap();
        let event_ref = event.to_ref();
        assert_eq!(event_ref.time, 100);
        assert_eq!(event_ref.self_id, 2);
        assert_eq!(event_ref.post_type, PostType::Notice);
        assert_eq!(event_ref.message_id, None);
    }
}
