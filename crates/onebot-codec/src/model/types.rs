//! Common OneBot v11 types.
//!
//! This module defines shared types used across events and echoes, such as
//! sender information and anonymous user data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::flex;
use crate::error::{CodecError, CodecResult};

/// Message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// One-to-one chat.
    Private,
    /// Group chat.
    Group,
}

impl MessageType {
    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Private => "private",
            MessageType::Group => "group",
        }
    }
}

/// Gender as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Unknown.
    Unknown,
}

/// Group member role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Group owner.
    Owner,
    /// Administrator.
    Admin,
    /// Regular member.
    Member,
}

/// Sender of a private message. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateSender {
    /// User ID.
    #[serde(default, deserialize_with = "flex::opt_int", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Gender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Age.
    #[serde(default, deserialize_with = "flex::opt_int", skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

/// Sender of a group message. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSender {
    /// User ID.
    #[serde(default, deserialize_with = "flex::opt_int", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Group card (group nickname).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    /// Gender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Age.
    #[serde(default, deserialize_with = "flex::opt_int", skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    /// Area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// Membership level.
    #[serde(default, deserialize_with = "flex::opt_string", skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Group role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Message sender information, shaped by the message type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageSender {
    /// Private message sender.
    Private(PrivateSender),
    /// Group message sender.
    Group(GroupSender),
}

impl MessageSender {
    /// Resolves a raw sender record using the accompanying message type.
    ///
    /// A missing or `null` sender decodes as an empty record.
    pub fn resolve(message_type: MessageType, raw: Option<Value>) -> CodecResult<Self> {
        let raw = match raw {
            None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
            Some(raw) => raw,
        };
        let context = format!("{} sender", message_type.as_str());
        match message_type {
            MessageType::Private => serde_json::from_value(raw).map(MessageSender::Private),
            MessageType::Group => serde_json::from_value(raw).map(MessageSender::Group),
        }
        .map_err(|err| CodecError::schema(context, err))
    }

    /// Returns the sender's user ID, if reported.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            MessageSender::Private(s) => s.user_id,
            MessageSender::Group(s) => s.user_id,
        }
    }

    /// Returns the display name: group card if set, otherwise nickname.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            MessageSender::Private(s) => s.nickname.as_deref(),
            MessageSender::Group(s) => s
                .card
                .as_deref()
                .filter(|card| !card.is_empty())
                .or(s.nickname.as_deref()),
        }
    }
}

/// Anonymous user information (for anonymous group messages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anonymous {
    /// Anonymous user ID.
    #[serde(deserialize_with = "flex::int")]
    pub id: i64,
    /// Anonymous user name.
    pub name: String,
    /// Flag for muting.
    pub flag: String,
}
