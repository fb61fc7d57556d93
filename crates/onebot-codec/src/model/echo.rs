//! Inbound replies to actions.
//!
//! Every reply shares the envelope
//!
//! ```json
//! {"status": "ok" | "async" | "failed", "retcode": 0, "data": {...} | [...] | null, "echo": "<id>"}
//! ```
//!
//! The shape of `data` depends on the command that produced it, described by
//! an [`EchoKind`]. Most shapes are closed and reject undeclared fields;
//! `get_status` and `get_version` are open and keep them in an `extra` map.
//!
//! # Example
//!
//! ```rust
//! use onebot_codec::model::echo::{EchoData, EchoKind, decode_echo};
//! use onebot_codec::{CodecConfig, SegmentRegistry, UuidIdGenerator};
//! use serde_json::json;
//!
//! let raw = json!({"status": "ok", "retcode": 0, "data": {"message_id": 7}});
//! let echo = decode_echo(
//!     &SegmentRegistry::new(),
//!     &CodecConfig::default(),
//!     &UuidIdGenerator,
//!     raw,
//!     EchoKind::for_action("send_msg"),
//! )
//! .unwrap();
//! assert!(echo.ok());
//! assert!(matches!(echo.data, EchoData::SendMsg(ref d) if d.message_id == 7));
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::flex;
use super::from_value;
use super::message::{decode_value, json_kind};
use super::registry::SegmentRegistry;
use super::segment::{NodeData, Segment};
use super::types::{MessageSender, MessageType, Role, Sex};
use crate::config::CodecConfig;
use crate::context::IdGenerator;
use crate::error::{CodecError, CodecResult};

/// Reply status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EchoStatus {
    /// Completed.
    Ok,
    /// Accepted, result not reported.
    Async,
    /// Rejected or failed.
    Failed,
}

/// The expected shape of a reply's `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EchoKind {
    /// `data` must be `null`.
    Empty,
    SendMsg,
    SendForwardMsg,
    GetMsg,
    GetForwardMsg,
    GetLoginInfo,
    GetStrangerInfo,
    GetFriendList,
    GetGroupInfo,
    GetGroupList,
    GetGroupMemberInfo,
    GetGroupMemberList,
    GetGroupHonorInfo,
    GetCookies,
    GetCsrfToken,
    GetCredentials,
    GetRecord,
    GetImage,
    CanSendImage,
    CanSendRecord,
    /// Open shape.
    GetStatus,
    /// Open shape.
    GetVersion,
    /// Any JSON, unchecked.
    Raw,
}

impl EchoKind {
    /// Maps a command name to the shape of its reply.
    pub fn for_action(action: &str) -> Self {
        match action {
            "send_msg" | "send_private_msg" | "send_group_msg" => EchoKind::SendMsg,
            "send_forward_msg" | "send_private_forward_msg" | "send_group_forward_msg" => {
                EchoKind::SendForwardMsg
            }
            "get_msg" => EchoKind::GetMsg,
            "get_forward_msg" => EchoKind::GetForwardMsg,
            "get_login_info" => EchoKind::GetLoginInfo,
            "get_stranger_info" => EchoKind::GetStrangerInfo,
            "get_friend_list" => EchoKind::GetFriendList,
            "get_group_info" => EchoKind::GetGroupInfo,
            "get_group_list" => EchoKind::GetGroupList,
            "get_group_member_info" => EchoKind::GetGroupMemberInfo,
            "get_group_member_list" => EchoKind::GetGroupMemberList,
            "get_group_honor_info" => EchoKind::GetGroupHonorInfo,
            "get_cookies" => EchoKind::GetCookies,
            "get_csrf_token" => EchoKind::GetCsrfToken,
            "get_credentials" => EchoKind::GetCredentials,
            "get_record" => EchoKind::GetRecord,
            "get_image" => EchoKind::GetImage,
            "can_send_image" => EchoKind::CanSendImage,
            "can_send_record" => EchoKind::CanSendRecord,
            "get_status" => EchoKind::GetStatus,
            "get_version_info" | "get_version" => EchoKind::GetVersion,
            "delete_msg"
            | "send_like"
            | "set_group_kick"
            | "set_group_ban"
            | "set_group_anonymous_ban"
            | "set_group_whole_ban"
            | "set_group_admin"
            | "set_group_anonymous"
            | "set_group_card"
            | "set_group_name"
            | "set_group_leave"
            | "set_group_special_title"
            | "set_friend_add_request"
            | "set_group_add_request"
            | "set_restart"
            | "clean_cache" => EchoKind::Empty,
            _ => EchoKind::Raw,
        }
    }

    /// Short name used in error contexts.
    pub fn name(self) -> &'static str {
        match self {
            EchoKind::Empty => "empty",
            EchoKind::SendMsg => "send_msg",
            EchoKind::SendForwardMsg => "send_forward_msg",
            EchoKind::GetMsg => "get_msg",
            EchoKind::GetForwardMsg => "get_forward_msg",
            EchoKind::GetLoginInfo => "get_login_info",
            EchoKind::GetStrangerInfo => "get_stranger_info",
            EchoKind::GetFriendList => "get_friend_list",
            EchoKind::GetGroupInfo => "get_group_info",
            EchoKind::GetGroupList => "get_group_list",
            EchoKind::GetGroupMemberInfo => "get_group_member_info",
            EchoKind::GetGroupMemberList => "get_group_member_list",
            EchoKind::GetGroupHonorInfo => "get_group_honor_info",
            EchoKind::GetCookies => "get_cookies",
            EchoKind::GetCsrfToken => "get_csrf_token",
            EchoKind::GetCredentials => "get_credentials",
            EchoKind::GetRecord => "get_record",
            EchoKind::GetImage => "get_image",
            EchoKind::CanSendImage => "can_send_image",
            EchoKind::CanSendRecord => "can_send_record",
            EchoKind::GetStatus => "get_status",
            EchoKind::GetVersion => "get_version",
            EchoKind::Raw => "raw",
        }
    }

    /// Returns `true` for shapes that keep undeclared fields.
    pub fn is_open(self) -> bool {
        matches!(self, EchoKind::GetStatus | EchoKind::GetVersion | EchoKind::Raw)
    }
}

/// A decoded reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    /// Decode time, in Unix seconds.
    pub time: i64,
    /// This reply's own id.
    pub id: String,
    /// Reply status.
    pub status: EchoStatus,
    /// Implementation result code.
    pub retcode: i64,
    /// Narrowed payload.
    pub data: EchoData,
    /// Correlation key copied from the originating action, if any.
    pub echo: Option<String>,
    /// Error message, on failure.
    pub msg: Option<String>,
    /// Human-readable error description, on failure.
    pub wording: Option<String>,
}

impl Echo {
    /// Returns `true` iff the status is `ok`.
    pub fn ok(&self) -> bool {
        self.status == EchoStatus::Ok
    }
}

/// Reply payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum EchoData {
    Empty,
    SendMsg(SendMsgData),
    SendForwardMsg(SendForwardMsgData),
    GetMsg(GetMsgData),
    GetForwardMsg(GetForwardMsgData),
    LoginInfo(LoginInfo),
    StrangerInfo(StrangerInfo),
    FriendList(Vec<FriendInfo>),
    GroupInfo(GroupInfo),
    GroupList(Vec<GroupInfo>),
    GroupMemberInfo(GroupMemberInfo),
    GroupMemberList(Vec<GroupMemberInfo>),
    GroupHonorInfo(GroupHonorInfo),
    Cookies(CookiesData),
    CsrfToken(CsrfTokenData),
    Credentials(CredentialsData),
    Record(FileData),
    Image(FileData),
    CanSendImage(YesData),
    CanSendRecord(YesData),
    Status(StatusData),
    Version(VersionData),
    /// Unchecked payload: unknown commands, and any non-`ok` reply.
    Raw(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMsgData {
    #[serde(deserialize_with = "flex::int")]
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendForwardMsgData {
    #[serde(deserialize_with = "flex::int")]
    pub message_id: i64,
    #[serde(deserialize_with = "flex::string")]
    pub forward_id: String,
}

/// A stored message, with its content resolved through the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct GetMsgData {
    pub time: i64,
    pub message_type: MessageType,
    pub message_id: i64,
    pub real_id: i64,
    pub sender: MessageSender,
    pub message: Vec<Segment>,
    pub group_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGetMsg {
    #[serde(deserialize_with = "flex::int")]
    time: i64,
    message_type: MessageType,
    #[serde(deserialize_with = "flex::int")]
    message_id: i64,
    #[serde(deserialize_with = "flex::int")]
    real_id: i64,
    sender: Value,
    message: Value,
    #[serde(default, deserialize_with = "flex::opt_int")]
    group_id: Option<i64>,
}

/// A forwarded conversation, as node segments.
#[derive(Debug, Clone, PartialEq)]
pub struct GetForwardMsgData {
    pub message: Vec<NodeData>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGetForwardMsg {
    message: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginInfo {
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrangerInfo {
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    pub nickname: String,
    pub sex: Sex,
    #[serde(deserialize_with = "flex::int")]
    pub age: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FriendInfo {
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    pub nickname: String,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupInfo {
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    pub group_name: String,
    #[serde(deserialize_with = "flex::int")]
    pub member_count: i64,
    #[serde(deserialize_with = "flex::int")]
    pub max_member_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupMemberInfo {
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    pub nickname: String,
    pub card: String,
    /// Free text; implementations report values beyond `male`/`female`/`unknown`.
    pub sex: String,
    #[serde(deserialize_with = "flex::int")]
    pub age: i64,
    pub area: String,
    #[serde(deserialize_with = "flex::int")]
    pub join_time: i64,
    #[serde(deserialize_with = "flex::int")]
    pub last_sent_time: i64,
    #[serde(deserialize_with = "flex::string")]
    pub level: String,
    pub role: Role,
    pub unfriendly: bool,
    pub title: String,
    #[serde(deserialize_with = "flex::int")]
    pub title_expire_time: i64,
    pub card_changeable: bool,
}

/// The current most-talkative member of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurrentTalkative {
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    pub nickname: String,
    pub avatar: String,
    #[serde(deserialize_with = "flex::int")]
    pub day_count: i64,
}

/// One holder of a group honor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HonorHolder {
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    pub nickname: String,
    pub avatar: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupHonorInfo {
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    #[serde(default)]
    pub current_talkative: Option<CurrentTalkative>,
    #[serde(default)]
    pub talkative_list: Option<Vec<HonorHolder>>,
    #[serde(default)]
    pub performer_list: Option<Vec<HonorHolder>>,
    #[serde(default)]
    pub legend_list: Option<Vec<HonorHolder>>,
    #[serde(default)]
    pub strong_newbie_list: Option<Vec<HonorHolder>>,
    #[serde(default)]
    pub emotion_list: Option<Vec<HonorHolder>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CookiesData {
    pub cookies: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsrfTokenData {
    #[serde(deserialize_with = "flex::int")]
    pub token: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsData {
    pub cookies: String,
    #[serde(deserialize_with = "flex::int")]
    pub csrf_token: i64,
}

/// A local path to a converted media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileData {
    pub file: String,
}

/// Capability check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YesData {
    pub yes: bool,
}

/// Implementation health. Undeclared fields land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub online: bool,
    pub good: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Implementation version. Undeclared fields land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionData {
    pub app_name: String,
    pub app_version: String,
    pub protocol_version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Decoding
// ============================================================================

#[derive(Deserialize)]
struct Envelope {
    status: EchoStatus,
    #[serde(deserialize_with = "flex::int")]
    retcode: i64,
    #[serde(default)]
    data: Value,
    #[serde(default, deserialize_with = "flex::opt_string")]
    echo: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    wording: Option<String>,
}

/// Decodes one reply envelope, narrowing `data` to `kind`.
///
/// Narrowing only applies to `ok` replies; other statuses keep `data` raw.
pub fn decode_echo(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    ids: &dyn IdGenerator,
    raw: Value,
    kind: EchoKind,
) -> CodecResult<Echo> {
    trace!(raw = %raw, kind = kind.name(), "Decoding echo");
    if !raw.is_object() {
        return Err(CodecError::schema("echo", "envelope is not an object"));
    }
    let envelope: Envelope = from_value("echo", raw)?;
    if !matches!(envelope.data, Value::Object(_) | Value::Array(_) | Value::Null) {
        return Err(CodecError::schema(
            "echo",
            format!("`data` must be an object, an array or null, got {}", json_kind(&envelope.data)),
        ));
    }

    let data = match envelope.status {
        EchoStatus::Ok => narrow(registry, config, kind, envelope.data)?,
        EchoStatus::Async | EchoStatus::Failed => EchoData::Raw(envelope.data),
    };
    debug!(
        status = ?envelope.status,
        retcode = envelope.retcode,
        kind = kind.name(),
        "Decoded echo"
    );

    Ok(Echo {
        time: unix_now(),
        id: ids.next_id(),
        status: envelope.status,
        retcode: envelope.retcode,
        data,
        echo: envelope.echo,
        msg: envelope.msg,
        wording: envelope.wording,
    })
}

fn narrow(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    kind: EchoKind,
    data: Value,
) -> CodecResult<EchoData> {
    let context = format!("echo {}", kind.name());
    let data = match kind {
        EchoKind::Empty => match data {
            Value::Null => EchoData::Empty,
            other => {
                return Err(CodecError::schema(
                    context,
                    format!("expected null data, got {}", json_kind(&other)),
                ));
            }
        },
        EchoKind::SendMsg => EchoData::SendMsg(from_value(context, data)?),
        EchoKind::SendForwardMsg => EchoData::SendForwardMsg(from_value(context, data)?),
        EchoKind::GetMsg => {
            let raw: RawGetMsg = from_value(context, data)?;
            EchoData::GetMsg(GetMsgData {
                time: raw.time,
                message_type: raw.message_type,
                message_id: raw.message_id,
                real_id: raw.real_id,
                sender: MessageSender::resolve(raw.message_type, Some(raw.sender))?,
                message: decode_value(registry, config, raw.message)?,
                group_id: raw.group_id,
            })
        }
        EchoKind::GetForwardMsg => {
            let raw: RawGetForwardMsg = from_value(context.clone(), data)?;
            let message = decode_value(registry, config, raw.message)?
                .into_iter()
                .map(|segment| match segment {
                    Segment::Node(node) => Ok(node),
                    other => Err(CodecError::schema(
                        context.clone(),
                        format!("expected node segments, got '{}'", other.kind()),
                    )),
                })
                .collect::<CodecResult<Vec<_>>>()?;
            EchoData::GetForwardMsg(GetForwardMsgData { message })
        }
        EchoKind::GetLoginInfo => EchoData::LoginInfo(from_value(context, data)?),
        EchoKind::GetStrangerInfo => EchoData::StrangerInfo(from_value(context, data)?),
        EchoKind::GetFriendList => EchoData::FriendList(from_value(context, data)?),
        EchoKind::GetGroupInfo => EchoData::GroupInfo(from_value(context, data)?),
        EchoKind::GetGroupList => EchoData::GroupList(from_value(context, data)?),
        EchoKind::GetGroupMemberInfo => EchoData::GroupMemberInfo(from_value(context, data)?),
        EchoKind::GetGroupMemberList => EchoData::GroupMemberList(from_value(context, data)?),
        EchoKind::GetGroupHonorInfo => EchoData::GroupHonorInfo(from_value(context, data)?),
        EchoKind::GetCookies => EchoData::Cookies(from_value(context, data)?),
        EchoKind::GetCsrfToken => EchoData::CsrfToken(from_value(context, data)?),
        EchoKind::GetCredentials => EchoData::Credentials(from_value(context, data)?),
        EchoKind::GetRecord => EchoData::Record(from_value(context, data)?),
        EchoKind::GetImage => EchoData::Image(from_value(context, data)?),
        EchoKind::CanSendImage => EchoData::CanSendImage(from_value(context, data)?),
        EchoKind::CanSendRecord => EchoData::CanSendRecord(from_value(context, data)?),
        EchoKind::GetStatus => EchoData::Status(from_value(context, data)?),
        EchoKind::GetVersion => EchoData::Version(from_value(context, data)?),
        EchoKind::Raw => EchoData::Raw(data),
    };
    Ok(data)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::SequentialIdGenerator;

    fn decode(raw: Value, kind: EchoKind) -> CodecResult<Echo> {
        decode_echo(
            &SegmentRegistry::new(),
            &CodecConfig::default(),
            &SequentialIdGenerator::new("e-"),
            raw,
            kind,
        )
    }

    fn ok(data: Value) -> Value {
        json!({"status": "ok", "retcode": 0, "data": data})
    }

    #[test]
    fn test_status_tristate() {
        for (status, expected) in [("ok", true), ("async", false), ("failed", false)] {
            let echo = decode(
                json!({"status": status, "retcode": 0, "data": null}),
                EchoKind::Raw,
            )
            .unwrap();
            assert_eq!(echo.ok(), expected);
        }

        let err = decode(json!({"status": "maybe", "retcode": 0, "data": null}), EchoKind::Raw)
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));
    }

    #[test]
    fn test_envelope_fields() {
        let echo = decode(
            json!({
                "status": "failed", "retcode": 1400, "data": null,
                "echo": "abc", "msg": "BAD_REQUEST", "wording": "bad"
            }),
            EchoKind::SendMsg,
        )
        .unwrap();
        assert_eq!(echo.retcode, 1400);
        assert_eq!(echo.echo.as_deref(), Some("abc"));
        assert_eq!(echo.msg.as_deref(), Some("BAD_REQUEST"));
        assert_eq!(echo.data, EchoData::Raw(Value::Null));
        assert_eq!(echo.id, "e-1");

        let err = decode(json!({"status": "ok", "retcode": 0, "data": 5}), EchoKind::Raw)
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));
    }

    #[test]
    fn test_open_shapes_keep_extra_fields() {
        let echo = decode(ok(json!({"online": true, "good": true, "extra": 1})), EchoKind::GetStatus)
            .unwrap();
        let EchoData::Status(status) = echo.data else {
            panic!("expected status data")
        };
        assert!(status.online);
        assert_eq!(status.extra.get("extra"), Some(&json!(1)));

        let echo = decode(
            ok(json!({
                "app_name": "x", "app_version": "1", "protocol_version": "v11", "extra": 1
            })),
            EchoKind::GetVersion,
        )
        .unwrap();
        let EchoData::Version(version) = echo.data else {
            panic!("expected version data")
        };
        assert_eq!(version.extra.get("extra"), Some(&json!(1)));

        let err = decode(ok(json!({"online": "yes", "good": true})), EchoKind::GetStatus)
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));
    }

    #[test]
    fn test_closed_shapes_reject_extra_fields() {
        let cases = [
            (EchoKind::SendMsg, json!({"message_id": 1, "extra": 1})),
            (EchoKind::GetLoginInfo, json!({"user_id": 1, "nickname": "n", "extra": 1})),
            (EchoKind::GetCookies, json!({"cookies": "c", "extra": 1})),
            (EchoKind::CanSendImage, json!({"yes": true, "extra": 1})),
            (
                EchoKind::GetFriendList,
                json!([{"user_id": 1, "nickname": "n", "remark": "r", "extra": 1}]),
            ),
        ];
        for (kind, data) in cases {
            let err = decode(ok(data), kind).unwrap_err();
            assert!(
                matches!(err, CodecError::SchemaViolation { .. }),
                "{kind:?} accepted an extra field"
            );
        }
    }

    #[test]
    fn test_closed_shapes() {
        let echo = decode(
            ok(json!({"user_id": "10", "nickname": "bot"})),
            EchoKind::GetLoginInfo,
        )
        .unwrap();
        assert_eq!(
            echo.data,
            EchoData::LoginInfo(LoginInfo {
                user_id: 10,
                nickname: "bot".to_string()
            })
        );

        let echo = decode(
            ok(json!([{"group_id": 1, "group_name": "g", "member_count": 3, "max_member_count": 200}])),
            EchoKind::GetGroupList,
        )
        .unwrap();
        assert!(matches!(echo.data, EchoData::GroupList(ref groups) if groups.len() == 1));

        let echo = decode(
            ok(json!({
                "group_id": 1,
                "current_talkative": {"user_id": 2, "nickname": "n", "avatar": "a", "day_count": 3},
                "talkative_list": [{"user_id": 2, "nickname": "n", "avatar": "a", "description": "d"}]
            })),
            EchoKind::GetGroupHonorInfo,
        )
        .unwrap();
        let EchoData::GroupHonorInfo(honor) = echo.data else {
            panic!("expected honor data")
        };
        assert_eq!(honor.current_talkative.map(|c| c.day_count), Some(3));
        assert!(honor.legend_list.is_none());
    }

    #[test]
    fn test_group_member_sex_is_free_text() {
        let member = json!({
            "group_id": 1, "user_id": 2, "nickname": "n", "card": "", "sex": "robot",
            "age": "18", "area": "", "join_time": 0, "last_sent_time": 0, "level": 3,
            "role": "member", "unfriendly": false, "title": "", "title_expire_time": 0,
            "card_changeable": true
        });
        let echo = decode(ok(member.clone()), EchoKind::GetGroupMemberInfo).unwrap();
        let EchoData::GroupMemberInfo(info) = echo.data else {
            panic!("expected member data")
        };
        assert_eq!(info.sex, "robot");
        assert_eq!(info.level, "3");

        let echo = decode(ok(json!([member])), EchoKind::GetGroupMemberList).unwrap();
        assert!(matches!(echo.data, EchoData::GroupMemberList(ref m) if m[0].sex == "robot"));
    }

    #[test]
    fn test_empty_shape_requires_null() {
        let echo = decode(ok(Value::Null), EchoKind::for_action("delete_msg")).unwrap();
        assert_eq!(echo.data, EchoData::Empty);

        let err = decode(ok(json!({})), EchoKind::Empty).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));
    }

    #[test]
    fn test_get_msg_resolves_sender_and_message() {
        let echo = decode(
            ok(json!({
                "time": 1, "message_type": "group", "message_id": 2, "real_id": 3,
                "group_id": 4,
                "sender": {"user_id": 5, "nickname": "n", "card": "c"},
                "message": "hi[CQ:face,id=14]"
            })),
            EchoKind::GetMsg,
        )
        .unwrap();
        let EchoData::GetMsg(msg) = echo.data else {
            panic!("expected get_msg data")
        };
        assert!(matches!(msg.sender, MessageSender::Group(_)));
        assert_eq!(msg.message, vec![Segment::text("hi"), Segment::face(14)]);
        assert_eq!(msg.group_id, Some(4));
    }

    #[test]
    fn test_get_forward_msg_resolves_nodes() {
        let echo = decode(
            ok(json!({
                "message": [{
                    "type": "node",
                    "data": {
                        "user_id": 1, "nickname": "a",
                        "content": [{"type": "text", "data": {"text": "inner"}}]
                    }
                }]
            })),
            EchoKind::GetForwardMsg,
        )
        .unwrap();
        let EchoData::GetForwardMsg(forward) = echo.data else {
            panic!("expected forward data")
        };
        assert_eq!(forward.message.len(), 1);
        assert_eq!(forward.message[0].content(), Some(&[Segment::text("inner")][..]));

        let err = decode(ok(json!({"message": "plain"})), EchoKind::GetForwardMsg).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));
    }

    #[test]
    fn test_for_action() {
        assert_eq!(EchoKind::for_action("send_group_msg"), EchoKind::SendMsg);
        assert_eq!(
            EchoKind::for_action("send_private_forward_msg"),
            EchoKind::SendForwardMsg
        );
        assert_eq!(EchoKind::for_action("set_group_ban"), EchoKind::Empty);
        assert_eq!(EchoKind::for_action("get_unknown_thing"), EchoKind::Raw);
        assert!(EchoKind::GetStatus.is_open());
        assert!(!EchoKind::GetGroupInfo.is_open());
    }
}
