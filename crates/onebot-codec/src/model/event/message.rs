//! Message events.
//!
//! # Shape
//!
//! ```text
//! MessageEvent { time, self_id, message_type, sub_type, message_id, user_id,
//!                message, raw_message, font, sender, group_id?, anonymous? }
//! ```
//!
//! `message` may arrive in either wire form and is resolved through the
//! segment registry. `sender` is shaped by `message_type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::leaf;
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::model::flex;
use crate::model::message::{self as codec, Message};
use crate::model::registry::SegmentRegistry;
use crate::model::types::{Anonymous, MessageSender, MessageType};

/// Message sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSubType {
    /// Private message from a friend.
    Friend,
    /// Temporary session started from a group.
    Group,
    /// Other private message.
    Other,
    /// Normal group message.
    Normal,
    /// Anonymous group message.
    Anonymous,
    /// Group system notice.
    Notice,
}

/// A private or group message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Unix timestamp.
    pub time: i64,
    /// Bot's QQ ID.
    pub self_id: i64,
    /// Private or group.
    pub message_type: MessageType,
    /// Sub-type.
    pub sub_type: MessageSubType,
    /// Message ID.
    pub message_id: i64,
    /// Sender's user ID.
    pub user_id: i64,
    /// Message content.
    pub message: Message,
    /// Raw message string (CQ codes or plain text).
    pub raw_message: String,
    /// Font (usually 0).
    pub font: i64,
    /// Sender information.
    pub sender: MessageSender,
    /// Group ID. Some implementations omit it on group messages.
    pub group_id: Option<i64>,
    /// Anonymous user info (if anonymous).
    pub anonymous: Option<Anonymous>,
    /// Source group of a temporary session.
    pub temp_source: Option<i64>,
}

impl MessageEvent {
    /// Returns `true` for group messages.
    pub fn is_group(&self) -> bool {
        self.message_type == MessageType::Group
    }

    /// Extracts plain text from the message segments.
    pub fn plain_text(&self) -> String {
        self.message.plain_text()
    }
}

#[derive(Deserialize)]
struct RawMessageEvent {
    #[serde(deserialize_with = "flex::int")]
    time: i64,
    #[serde(deserialize_with = "flex::int")]
    self_id: i64,
    message_type: MessageType,
    sub_type: MessageSubType,
    #[serde(deserialize_with = "flex::int")]
    message_id: i64,
    #[serde(deserialize_with = "flex::int")]
    user_id: i64,
    message: Option<Value>,
    #[serde(default)]
    raw_message: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_int")]
    font: Option<i64>,
    #[serde(default)]
    sender: Option<Value>,
    #[serde(default, deserialize_with = "flex::opt_int")]
    group_id: Option<i64>,
    #[serde(default)]
    anonymous: Option<Anonymous>,
    #[serde(default, deserialize_with = "flex::opt_int")]
    temp_source: Option<i64>,
}

pub(crate) fn decode(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    raw: Value,
) -> CodecResult<MessageEvent> {
    let raw: RawMessageEvent = leaf("message", raw)?;

    let message = match raw.message {
        None | Some(Value::Null) => {
            return Err(CodecError::schema("event message", "missing field `message`"));
        }
        Some(message) => codec::decode_value(registry, config, message)?,
    };

    Ok(MessageEvent {
        time: raw.time,
        self_id: raw.self_id,
        message_type: raw.message_type,
        sub_type: raw.sub_type,
        message_id: raw.message_id,
        user_id: raw.user_id,
        message: Message::from_segments(message),
        raw_message: raw.raw_message.unwrap_or_default(),
        font: raw.font.unwrap_or_default(),
        sender: MessageSender::resolve(raw.message_type, raw.sender)?,
        group_id: raw.group_id,
        anonymous: raw.anonymous,
        temp_source: raw.temp_source,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::segment::Segment;
    use crate::model::types::GroupSender;

    fn decode_raw(raw: Value) -> CodecResult<MessageEvent> {
        decode(&SegmentRegistry::new(), &CodecConfig::default(), raw)
    }

    #[test]
    fn test_group_message() {
        let event = decode_raw(json!({
            "time": 1, "self_id": 1, "post_type": "message",
            "message_type": "group", "sub_type": "normal",
            "message_id": 5, "user_id": 9, "group_id": 100,
            "message": [{"type": "text", "data": {"text": "hi"}}],
            "raw_message": "hi", "font": 0,
            "sender": {"user_id": 9, "nickname": "n", "role": "member"}
        }))
        .unwrap();
        assert!(event.is_group());
        assert_eq!(event.group_id, Some(100));
        assert_eq!(event.message.segments(), &[Segment::text("hi")]);
        assert!(matches!(event.sender, MessageSender::Group(GroupSender { user_id: Some(9), .. })));
    }

    #[test]
    fn test_group_message_without_group_id() {
        let event = decode_raw(json!({
            "time": 1, "self_id": 1, "message_type": "group", "sub_type": "normal",
            "message_id": 5, "user_id": 9, "message": "hi", "sender": {"card": "c"}
        }))
        .unwrap();
        assert!(event.is_group());
        assert_eq!(event.group_id, None);
        assert_eq!(event.sender.display_name(), Some("c"));
    }

    #[test]
    fn test_inline_message_field() {
        let event = decode_raw(json!({
            "time": 1, "self_id": 1, "message_type": "private", "sub_type": "friend",
            "message_id": "5", "user_id": 9,
            "message": "hello [CQ:at,qq=10001] world"
        }))
        .unwrap();
        assert_eq!(event.message.mentioned_users(), vec![10001]);
        assert_eq!(event.raw_message, "");
        assert_eq!(event.message_id, 5);
    }

    #[test]
    fn test_rejections() {
        let base = json!({
            "time": 1, "self_id": 1, "message_type": "private", "sub_type": "friend",
            "message_id": 5, "user_id": 9, "message": "x"
        });

        let mut missing_message = base.clone();
        missing_message.as_object_mut().unwrap().remove("message");
        assert!(matches!(
            decode_raw(missing_message).unwrap_err(),
            CodecError::SchemaViolation { .. }
        ));

        let mut bad_sub_type = base.clone();
        bad_sub_type["sub_type"] = json!("weird");
        assert!(decode_raw(bad_sub_type).is_err());

        let mut bad_message = base;
        bad_message["message"] = json!([{"type": "face", "data": {}}]);
        assert!(decode_raw(bad_message).is_err());
    }
}
