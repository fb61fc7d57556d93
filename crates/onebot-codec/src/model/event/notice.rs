//! Notice Events
//!
//! # Hierarchy
//!
//! ```text
//! NoticeEvent { time, self_id, kind: NoticeKind }
//! └── NoticeKind (notice_type dispatch)
//!     ├── GroupUpload(GroupUploadEvent)
//!     ├── GroupAdmin(GroupAdminEvent)
//!     ├── ... other notice types ...
//!     ├── Notify(NotifyEvent { group_id, user_id, kind: NotifyKind })
//!     │   └── NotifyKind (sub_type dispatch)
//!     │       ├── Poke(PokeEvent)
//!     │       ├── LuckyKing(LuckyKingEvent)
//!     │       ├── Honor(HonorEvent)
//!     │       └── Other(UnknownKind)
//!     └── Other(UnknownKind)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{UnknownKind, discriminator, leaf};
use crate::error::CodecResult;
use crate::model::flex;

// ============================================================================
// NoticeEvent - Container for notice events
// ============================================================================

/// Notice event container.
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeEvent {
    /// Unix timestamp.
    pub time: i64,
    /// Bot's QQ ID.
    pub self_id: i64,
    /// The specific notice kind.
    pub kind: NoticeKind,
}

/// Notice kind dispatch based on `notice_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum NoticeKind {
    /// Group file upload.
    GroupUpload(GroupUploadEvent),
    /// Group admin change.
    GroupAdmin(GroupAdminEvent),
    /// Group member decrease.
    GroupDecrease(GroupDecreaseEvent),
    /// Group member increase.
    GroupIncrease(GroupIncreaseEvent),
    /// Group ban.
    GroupBan(GroupBanEvent),
    /// Friend added.
    FriendAdd(FriendAddEvent),
    /// Group message recall.
    GroupRecall(GroupRecallEvent),
    /// Friend message recall.
    FriendRecall(FriendRecallEvent),
    /// Group card (nickname) changed.
    GroupCard(GroupCardEvent),
    /// Offline file received.
    OfflineFile(OfflineFileEvent),
    /// Client status changed.
    ClientStatus(ClientStatusEvent),
    /// Essence message.
    Essence(EssenceEvent),
    /// Notify event (poke, lucky_king, honor).
    Notify(NotifyEvent),
    /// Any other `notice_type`.
    Other(UnknownKind),
}

pub(crate) fn decode(raw: Value) -> CodecResult<NoticeKind> {
    let notice_type = discriminator(&raw, "notice_type")?.to_string();
    Ok(match notice_type.as_str() {
        "group_upload" => NoticeKind::GroupUpload(leaf("notice group_upload", raw)?),
        "group_admin" => NoticeKind::GroupAdmin(leaf("notice group_admin", raw)?),
        "group_decrease" => NoticeKind::GroupDecrease(leaf("notice group_decrease", raw)?),
        "group_increase" => NoticeKind::GroupIncrease(leaf("notice group_increase", raw)?),
        "group_ban" => NoticeKind::GroupBan(leaf("notice group_ban", raw)?),
        "friend_add" => NoticeKind::FriendAdd(leaf("notice friend_add", raw)?),
        "group_recall" => NoticeKind::GroupRecall(leaf("notice group_recall", raw)?),
        "friend_recall" => NoticeKind::FriendRecall(leaf("notice friend_recall", raw)?),
        "group_card" => NoticeKind::GroupCard(leaf("notice group_card", raw)?),
        "offline_file" => NoticeKind::OfflineFile(leaf("notice offline_file", raw)?),
        "client_status" => NoticeKind::ClientStatus(leaf("notice client_status", raw)?),
        "essence" => NoticeKind::Essence(leaf("notice essence", raw)?),
        "notify" => NoticeKind::Notify(decode_notify(raw)?),
        other => NoticeKind::Other(UnknownKind::new(other, raw)),
    })
}

// ============================================================================
// Group Upload Event
// ============================================================================

/// Uploaded file info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// File ID.
    #[serde(deserialize_with = "flex::string")]
    pub id: String,
    /// File name.
    pub name: String,
    /// File size in bytes.
    #[serde(deserialize_with = "flex::int")]
    pub size: i64,
    /// Bus ID.
    #[serde(deserialize_with = "flex::int")]
    pub busid: i64,
}

/// Group file upload event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupUploadEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// Uploader's user ID.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// File information.
    pub file: UploadedFile,
}

// ============================================================================
// Group Admin Event
// ============================================================================

/// Group admin change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAdminEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// User ID whose admin status changed.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// Sub-type ("set" or "unset").
    pub sub_type: String,
}

// ============================================================================
// Group Decrease / Increase Events
// ============================================================================

/// Group member decrease event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDecreaseEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// User ID who left or was kicked.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// Operator user ID (who kicked, if applicable).
    #[serde(default, deserialize_with = "flex::opt_int")]
    pub operator_id: Option<i64>,
    /// Sub-type ("leave", "kick", "kick_me").
    pub sub_type: String,
}

/// Group member increase event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupIncreaseEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// User ID who joined.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// Operator user ID (who approved/invited).
    #[serde(default, deserialize_with = "flex::opt_int")]
    pub operator_id: Option<i64>,
    /// Sub-type ("approve", "invite").
    pub sub_type: String,
}

// ============================================================================
// Group Ban Event
// ============================================================================

/// Group ban event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBanEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// Banned user ID (0 for whole-group ban).
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// Operator user ID.
    #[serde(default, deserialize_with = "flex::opt_int")]
    pub operator_id: Option<i64>,
    /// Ban duration in seconds (0 = unban).
    #[serde(deserialize_with = "flex::int")]
    pub duration: i64,
    /// Sub-type ("ban", "lift_ban").
    pub sub_type: String,
}

// ============================================================================
// Friend Add / Recall Events
// ============================================================================

/// Friend added event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendAddEvent {
    /// New friend's user ID.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
}

/// Group message recall event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecallEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// Message author's user ID.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// Operator user ID (who recalled).
    #[serde(default, deserialize_with = "flex::opt_int")]
    pub operator_id: Option<i64>,
    /// Recalled message ID.
    #[serde(deserialize_with = "flex::int")]
    pub message_id: i64,
}

/// Friend message recall event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendRecallEvent {
    /// Friend's user ID.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// Recalled message ID.
    #[serde(deserialize_with = "flex::int")]
    pub message_id: i64,
}

// ============================================================================
// Group Card Event
// ============================================================================

/// Group card (nickname) change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCardEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// User ID whose card changed.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// New card.
    #[serde(default)]
    pub card_new: Option<String>,
    /// Old card.
    #[serde(default)]
    pub card_old: Option<String>,
}

// ============================================================================
// Offline File Event
// ============================================================================

/// Offline file info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineFile {
    /// File name.
    pub name: String,
    /// File size in bytes.
    #[serde(deserialize_with = "flex::int")]
    pub size: i64,
    /// Download URL.
    pub url: String,
}

/// Offline file received event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineFileEvent {
    /// Sender's user ID.
    #[serde(deserialize_with = "flex::int")]
    pub user_id: i64,
    /// File information.
    pub file: OfflineFile,
}

// ============================================================================
// Client Status Event
// ============================================================================

/// Device info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// App ID.
    #[serde(default, deserialize_with = "flex::opt_int")]
    pub app_id: Option<i64>,
    /// Device name.
    #[serde(default)]
    pub device_name: Option<String>,
    /// Device kind.
    #[serde(default)]
    pub device_kind: Option<String>,
}

/// Client status change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientStatusEvent {
    /// Online status.
    #[serde(default)]
    pub online: bool,
    /// Client device info.
    #[serde(default)]
    pub client: Option<Device>,
}

// ============================================================================
// Essence Event
// ============================================================================

/// Essence message event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssenceEvent {
    /// Group ID.
    #[serde(deserialize_with = "flex::int")]
    pub group_id: i64,
    /// Message sender ID.
    #[serde(deserialize_with = "flex::int")]
    pub sender_id: i64,
    /// Operator ID.
    #[serde(deserialize_with = "flex::int")]
    pub operator_id: i64,
    /// Message ID.
    #[serde(deserialize_with = "flex::int")]
    pub message_id: i64,
    /// Sub-type ("add", "delete").
    pub sub_type: String,
}

// ============================================================================
// NotifyEvent - Contains common notify fields
// ============================================================================

/// Notify event with common fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyEvent {
    /// Group ID (absent for friend pokes).
    pub group_id: Option<i64>,
    /// User ID.
    pub user_id: i64,
    /// The specific notify kind.
    pub kind: NotifyKind,
}

/// Notify kind dispatch based on `sub_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyKind {
    /// Poke event.
    Poke(PokeEvent),
    /// Lucky king (red packet) event.
    LuckyKing(LuckyKingEvent),
    /// Honor change event.
    Honor(HonorEvent),
    /// Any other `sub_type`.
    Other(UnknownKind),
}

/// Poke event specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokeEvent {
    /// User who was poked.
    #[serde(deserialize_with = "flex::int")]
    pub target_id: i64,
}

/// Lucky king (red packet) event specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckyKingEvent {
    /// User who got the lucky king.
    #[serde(deserialize_with = "flex::int")]
    pub target_id: i64,
}

/// Honor change event specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HonorEvent {
    /// Honor type ("talkative", "performer", "emotion").
    pub honor_type: String,
}

#[derive(Deserialize)]
struct NotifyHeader {
    #[serde(default, deserialize_with = "flex::opt_int")]
    group_id: Option<i64>,
    #[serde(deserialize_with = "flex::int")]
    user_id: i64,
}

fn decode_notify(raw: Value) -> CodecResult<NotifyEvent> {
    let header: NotifyHeader = leaf("notice notify", raw.clone())?;
    let sub_type = discriminator(&raw, "sub_type")?.to_string();
    let kind = match sub_type.as_str() {
        "poke" => NotifyKind::Poke(leaf("notice notify poke", raw)?),
        "lucky_king" => NotifyKind::LuckyKing(leaf("notice notify lucky_king", raw)?),
        "honor" => NotifyKind::Honor(leaf("notice notify honor", raw)?),
        other => NotifyKind::Other(UnknownKind::new(other, raw)),
    };
    Ok(NotifyEvent {
        group_id: header.group_id,
        user_id: header.user_id,
        kind,
    })
}
