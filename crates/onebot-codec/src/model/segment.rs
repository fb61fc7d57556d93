//! OneBot v11 Message Segment types.
//!
//! This module defines all message segment types as specified in the OneBot v11 protocol.
//! A message segment represents a single unit of content in a message, such as plain text,
//! images, mentions, etc.
//!
//! # Wire Mapping
//!
//! Each segment serializes to a `{"type": ..., "data": {...}}` record. Optional
//! fields that are absent are omitted, never emitted as `null`.
//!
//! Segments are only *decoded* through a [`SegmentRegistry`](super::registry::SegmentRegistry),
//! which also knows about kinds registered at startup. Every constructor here
//! produces a value that satisfies its own schema; the type system rules out
//! the rest (e.g. a node cannot carry both an id and custom content).
//!
//! # Example
//!
//! ```rust
//! use onebot_codec::Segment;
//!
//! let text = Segment::text("Hello, ");
//! let at = Segment::at(10001000);
//! let face = Segment::face(178);
//! assert_eq!(at.kind(), "at");
//! ```

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::flex;

// ============================================================================
// Segment Enum - The main message segment type
// ============================================================================

/// A OneBot v11 message segment.
///
/// One variant per built-in kind, plus [`Segment::Custom`] for kinds added
/// to the registry at startup and [`Segment::Opaque`] for unregistered kinds
/// kept under the pass-through policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Plain text content.
    Text(TextData),
    /// QQ emoji/face.
    Face(FaceData),
    /// Image.
    Image(ImageData),
    /// Voice/Audio record.
    Record(RecordData),
    /// Video.
    Video(VideoData),
    /// @mention someone.
    At(AtData),
    /// Rock-paper-scissors magic emoji.
    Rps(RpsData),
    /// Dice magic emoji.
    Dice(DiceData),
    /// Window shake (legacy poke).
    Shake(ShakeData),
    /// Poke message.
    Poke(PokeData),
    /// Anonymous flag (send only).
    Anonymous(AnonymousData),
    /// Link share.
    Share(ShareData),
    /// Contact recommendation.
    Contact(ContactData),
    /// Location.
    Location(LocationData),
    /// Music share.
    Music(MusicData),
    /// Reply to a message.
    Reply(ReplyData),
    /// Forward message reference.
    Forward(ForwardData),
    /// Forward node (for constructing forward messages).
    Node(NodeData),
    /// XML message.
    Xml(XmlData),
    /// JSON message.
    Json(JsonData),
    /// A kind registered on the segment registry.
    Custom(CustomSegment),
    /// An unregistered kind, kept verbatim.
    Opaque(CustomSegment),
}

impl Segment {
    /// Returns the wire discriminator of this segment.
    pub fn kind(&self) -> &str {
        match self {
            Segment::Text(_) => "text",
            Segment::Face(_) => "face",
            Segment::Image(_) => "image",
            Segment::Record(_) => "record",
            Segment::Video(_) => "video",
            Segment::At(_) => "at",
            Segment::Rps(_) => "rps",
            Segment::Dice(_) => "dice",
            Segment::Shake(_) => "shake",
            Segment::Poke(_) => "poke",
            Segment::Anonymous(_) => "anonymous",
            Segment::Share(_) => "share",
            Segment::Contact(_) => "contact",
            Segment::Location(_) => "location",
            Segment::Music(_) => "music",
            Segment::Reply(_) => "reply",
            Segment::Forward(_) => "forward",
            Segment::Node(_) => "node",
            Segment::Xml(_) => "xml",
            Segment::Json(_) => "json",
            Segment::Custom(seg) | Segment::Opaque(seg) => &seg.kind,
        }
    }

    /// Returns `true` for text segments.
    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text(_))
    }

    /// Returns the text content of a text segment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(data) => Some(&data.text),
            _ => None,
        }
    }

    /// Serializes the field record of this segment.
    pub fn data_map(&self) -> Map<String, Value> {
        match serde_json::to_value(DataRef(self)) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

struct DataRef<'a>(&'a Segment);

impl Serialize for DataRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Segment::Text(d) => d.serialize(serializer),
            Segment::Face(d) => d.serialize(serializer),
            Segment::Image(d) => d.serialize(serializer),
            Segment::Record(d) => d.serialize(serializer),
            Segment::Video(d) => d.serialize(serializer),
            Segment::At(d) => d.serialize(serializer),
            Segment::Rps(d) => d.serialize(serializer),
            Segment::Dice(d) => d.serialize(serializer),
            Segment::Shake(d) => d.serialize(serializer),
            Segment::Poke(d) => d.serialize(serializer),
            Segment::Anonymous(d) => d.serialize(serializer),
            Segment::Share(d) => d.serialize(serializer),
            Segment::Contact(d) => d.serialize(serializer),
            Segment::Location(d) => d.serialize(serializer),
            Segment::Music(d) => d.serialize(serializer),
            Segment::Reply(d) => d.serialize(serializer),
            Segment::Forward(d) => d.serialize(serializer),
            Segment::Node(d) => d.serialize(serializer),
            Segment::Xml(d) => d.serialize(serializer),
            Segment::Json(d) => d.serialize(serializer),
            Segment::Custom(d) | Segment::Opaque(d) => d.data.serialize(serializer),
        }
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Segment", 2)?;
        state.serialize_field("type", self.kind())?;
        state.serialize_field("data", &DataRef(self))?;
        state.end()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text(data) => write!(f, "{}", data.text),
            Segment::Face(data) => write!(f, "[表情:{}]", data.id),
            Segment::Image(data) => write!(f, "[图片:{}]", data.file()),
            Segment::Record(data) => write!(f, "[语音:{}]", data.file()),
            Segment::Video(data) => write!(f, "[视频:{}]", data.file()),
            Segment::At(data) => match data.qq {
                AtTarget::All => write!(f, "@全体成员"),
                AtTarget::User(id) => write!(f, "@{id}"),
            },
            Segment::Rps(_) => write!(f, "[猜拳]"),
            Segment::Dice(_) => write!(f, "[骰子]"),
            Segment::Shake(_) => write!(f, "[窗口抖动]"),
            Segment::Poke(data) => write!(f, "[戳一戳:{}]", data.poke_type()),
            Segment::Anonymous(_) => write!(f, "[匿名]"),
            Segment::Share(data) => write!(f, "[分享:{}]", data.title),
            Segment::Contact(data) => write!(f, "[推荐{}:{}]", data.contact_type.as_str(), data.id),
            Segment::Location(data) => write!(f, "[位置:{},{}]", data.lat, data.lon),
            Segment::Music(_) => write!(f, "[音乐]"),
            Segment::Reply(data) => write!(f, "[回复:{}]", data.id),
            Segment::Forward(data) => write!(f, "[合并转发:{}]", data.id),
            Segment::Node(_) => write!(f, "[转发节点]"),
            Segment::Xml(_) => write!(f, "[XML消息]"),
            Segment::Json(_) => write!(f, "[JSON消息]"),
            Segment::Custom(seg) | Segment::Opaque(seg) => write!(f, "[{}]", seg.kind),
        }
    }
}

// ============================================================================
// Segment Builder Methods
// ============================================================================

impl Segment {
    /// Creates a plain text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(TextData { text: text.into() })
    }

    /// Creates a QQ face/emoji segment.
    pub fn face(id: i64) -> Self {
        Segment::Face(FaceData { id })
    }

    /// Creates an image segment from a file path or URL.
    pub fn image(file: impl Into<String>) -> Self {
        Segment::Image(ImageData::Send(ImageSendData::new(file)))
    }

    /// Creates a flash image segment.
    pub fn flash_image(file: impl Into<String>) -> Self {
        Segment::Image(ImageData::Send(ImageSendData {
            image_type: Some(ImageType::Flash),
            ..ImageSendData::new(file)
        }))
    }

    /// Creates a voice/record segment.
    pub fn record(file: impl Into<String>) -> Self {
        Segment::Record(RecordData::Send(RecordSendData {
            file: file.into(),
            magic: None,
            cache: None,
            proxy: None,
            timeout: None,
        }))
    }

    /// Creates a video segment.
    pub fn video(file: impl Into<String>) -> Self {
        Segment::Video(VideoData::Send(VideoSendData {
            file: file.into(),
            cache: None,
            proxy: None,
            timeout: None,
        }))
    }

    /// Creates an @mention segment for a specific user.
    pub fn at(qq: i64) -> Self {
        Segment::At(AtData {
            qq: AtTarget::User(qq),
        })
    }

    /// Creates an @all segment to mention everyone.
    pub fn at_all() -> Self {
        Segment::At(AtData { qq: AtTarget::All })
    }

    /// Creates a rock-paper-scissors segment.
    pub fn rps() -> Self {
        Segment::Rps(RpsData {})
    }

    /// Creates a dice segment.
    pub fn dice() -> Self {
        Segment::Dice(DiceData {})
    }

    /// Creates a shake (legacy poke) segment.
    pub fn shake() -> Self {
        Segment::Shake(ShakeData {})
    }

    /// Creates a poke segment.
    pub fn poke(poke_type: impl Into<String>, id: i64) -> Self {
        Segment::Poke(PokeData::Send(PokeSendData {
            poke_type: poke_type.into(),
            id,
        }))
    }

    /// Creates an anonymous-send marker.
    pub fn anonymous(ignore: Option<bool>) -> Self {
        Segment::Anonymous(AnonymousData { ignore })
    }

    /// Creates a link share segment.
    pub fn share(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Segment::Share(ShareData {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            image: image.into(),
        })
    }

    /// Creates a friend recommendation segment.
    pub fn contact_qq(id: i64) -> Self {
        Segment::Contact(ContactData {
            contact_type: ContactType::Qq,
            id,
        })
    }

    /// Creates a group recommendation segment.
    pub fn contact_group(id: i64) -> Self {
        Segment::Contact(ContactData {
            contact_type: ContactType::Group,
            id,
        })
    }

    /// Creates a location segment.
    pub fn location(lat: f64, lon: f64) -> Self {
        Segment::Location(LocationData {
            lat,
            lon,
            title: None,
            content: None,
        })
    }

    /// Creates a music share segment (QQ Music, NetEase, Xiami).
    pub fn music(platform: MusicPlatform, id: impl Into<String>) -> Self {
        Segment::Music(MusicData::Platform(MusicPlatformData {
            platform,
            id: id.into(),
        }))
    }

    /// Creates a custom music share segment.
    pub fn music_custom(
        url: impl Into<String>,
        audio: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Segment::Music(MusicData::Custom(MusicCustomData {
            kind: MusicCustomTag::Custom,
            url: url.into(),
            audio: audio.into(),
            title: title.into(),
            content: None,
            image: None,
        }))
    }

    /// Creates a reply segment referencing another message.
    pub fn reply(id: impl Into<String>) -> Self {
        Segment::Reply(ReplyData { id: id.into() })
    }

    /// Creates a forward reference segment.
    pub fn forward(id: impl Into<String>) -> Self {
        Segment::Forward(ForwardData { id: id.into() })
    }

    /// Creates a forward node segment referencing an existing message.
    pub fn node_ref(id: impl Into<String>) -> Self {
        Segment::Node(NodeData::Reference(NodeRefData { id: id.into() }))
    }

    /// Creates a custom forward node using the standard key names.
    pub fn node_custom(
        user_id: i64,
        nickname: impl Into<String>,
        content: impl IntoIterator<Item = Segment>,
    ) -> Self {
        Segment::Node(NodeData::Custom(NodeCustomData {
            user_id,
            nickname: nickname.into(),
            content: content.into_iter().collect(),
        }))
    }

    /// Creates a custom forward node using the `uin`/`name` key names.
    pub fn node_legacy(
        uin: i64,
        name: impl Into<String>,
        content: impl IntoIterator<Item = Segment>,
    ) -> Self {
        Segment::Node(NodeData::Legacy(NodeLegacyData {
            uin,
            name: name.into(),
            content: content.into_iter().collect(),
        }))
    }

    /// Creates an XML message segment.
    pub fn xml(data: impl Into<String>) -> Self {
        Segment::Xml(XmlData { data: data.into() })
    }

    /// Creates a JSON message segment.
    pub fn json(data: impl Into<String>) -> Self {
        Segment::Json(JsonData { data: data.into() })
    }
}

// ============================================================================
// Segment Data Types
// ============================================================================

/// Plain text segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextData {
    /// The text content.
    #[serde(deserialize_with = "flex::string")]
    pub text: String,
}

/// QQ face/emoji segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaceData {
    /// The face ID. See QQ face ID table.
    #[serde(deserialize_with = "flex::int")]
    pub id: i64,
}

/// Image display type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// Flash image, disappears after viewing.
    Flash,
}

/// Image segment data: what the caller sends, or what the server reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageData {
    /// Send shape.
    Send(ImageSendData),
    /// Receive shape, with the resolved URL.
    Recv(ImageRecvData),
}

impl ImageData {
    /// Returns the file name, path, URL or base64 payload.
    pub fn file(&self) -> &str {
        match self {
            ImageData::Send(d) => &d.file,
            ImageData::Recv(d) => &d.file,
        }
    }

    /// Returns the download URL reported by the server.
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageData::Send(_) => None,
            ImageData::Recv(d) => Some(&d.url),
        }
    }
}

/// Image segment data (send).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSendData {
    /// Image file name, path, URL, or base64.
    #[serde(deserialize_with = "flex::string")]
    pub file: String,
    /// Image type, `None` for a normal image.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<ImageType>,
    /// Whether to use the cached file.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache: Option<bool>,
    /// Whether to download through the proxy.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub proxy: Option<bool>,
    /// Download timeout in seconds.
    #[serde(
        default,
        deserialize_with = "flex::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<i64>,
}

impl ImageSendData {
    /// Creates send data with only the file set.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            image_type: None,
            cache: None,
            proxy: None,
            timeout: None,
        }
    }
}

/// Image segment data (receive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageRecvData {
    /// Image file name.
    #[serde(deserialize_with = "flex::string")]
    pub file: String,
    /// Image type, `None` for a normal image.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<ImageType>,
    /// Image URL.
    #[serde(deserialize_with = "flex::string")]
    pub url: String,
}

/// Voice/Record segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordData {
    /// Send shape.
    Send(RecordSendData),
    /// Receive shape, with the resolved URL.
    Recv(RecordRecvData),
}

impl RecordData {
    /// Returns the audio file reference.
    pub fn file(&self) -> &str {
        match self {
            RecordData::Send(d) => &d.file,
            RecordData::Recv(d) => &d.file,
        }
    }
}

/// Record segment data (send).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordSendData {
    /// Audio file name, path, URL, or base64.
    #[serde(deserialize_with = "flex::string")]
    pub file: String,
    /// Voice change effect.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub magic: Option<bool>,
    /// Whether to use the cached file.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache: Option<bool>,
    /// Whether to download through the proxy.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub proxy: Option<bool>,
    /// Download timeout in seconds.
    #[serde(
        default,
        deserialize_with = "flex::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<i64>,
}

/// Record segment data (receive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordRecvData {
    /// Audio file name.
    #[serde(deserialize_with = "flex::string")]
    pub file: String,
    /// Voice change effect.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub magic: Option<bool>,
    /// Audio URL.
    #[serde(deserialize_with = "flex::string")]
    pub url: String,
}

/// Video segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoData {
    /// Send shape.
    Send(VideoSendData),
    /// Receive shape, with the resolved URL.
    Recv(VideoRecvData),
}

impl VideoData {
    /// Returns the video file reference.
    pub fn file(&self) -> &str {
        match self {
            VideoData::Send(d) => &d.file,
            VideoData::Recv(d) => &d.file,
        }
    }
}

/// Video segment data (send).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoSendData {
    /// Video file name, path, URL, or base64.
    #[serde(deserialize_with = "flex::string")]
    pub file: String,
    /// Whether to use the cached file.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache: Option<bool>,
    /// Whether to download through the proxy.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub proxy: Option<bool>,
    /// Download timeout in seconds.
    #[serde(
        default,
        deserialize_with = "flex::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<i64>,
}

/// Video segment data (receive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoRecvData {
    /// Video file name.
    #[serde(deserialize_with = "flex::string")]
    pub file: String,
    /// Video URL.
    #[serde(deserialize_with = "flex::string")]
    pub url: String,
}

/// Who an @mention points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtTarget {
    /// A single user by QQ number.
    User(i64),
    /// Everyone in the group (`"all"` on the wire).
    All,
}

impl Serialize for AtTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AtTarget::User(id) => serializer.serialize_i64(*id),
            AtTarget::All => serializer.serialize_str("all"),
        }
    }
}

struct AtTargetVisitor;

impl Visitor<'_> for AtTargetVisitor {
    type Value = AtTarget;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a QQ number or \"all\"")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<AtTarget, E> {
        Ok(AtTarget::User(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<AtTarget, E> {
        i64::try_from(v)
            .map(AtTarget::User)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<AtTarget, E> {
        if v == "all" {
            return Ok(AtTarget::All);
        }
        v.parse()
            .map(AtTarget::User)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for AtTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AtTargetVisitor)
    }
}

/// @mention segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtData {
    /// QQ number or `all` for @everyone.
    pub qq: AtTarget,
}

/// Rock-paper-scissors segment data (empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpsData {}

/// Dice segment data (empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiceData {}

/// Shake segment data (empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShakeData {}

/// Poke segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PokeData {
    /// Send shape.
    Send(PokeSendData),
    /// Receive shape, with the poke name.
    Recv(PokeRecvData),
}

impl PokeData {
    /// Returns the poke type.
    pub fn poke_type(&self) -> &str {
        match self {
            PokeData::Send(d) => &d.poke_type,
            PokeData::Recv(d) => &d.poke_type,
        }
    }
}

/// Poke segment data (send).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PokeSendData {
    /// Poke type. See Mirai's PokeMessage.
    #[serde(rename = "type", deserialize_with = "flex::string")]
    pub poke_type: String,
    /// Poke ID.
    #[serde(deserialize_with = "flex::int")]
    pub id: i64,
}

/// Poke segment data (receive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PokeRecvData {
    /// Poke type.
    #[serde(rename = "type", deserialize_with = "flex::string")]
    pub poke_type: String,
    /// Poke ID.
    #[serde(deserialize_with = "flex::int")]
    pub id: i64,
    /// Poke name.
    #[serde(deserialize_with = "flex::string")]
    pub name: String,
}

/// Anonymous segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnonymousData {
    /// Whether to send anyway if anonymity is unavailable.
    #[serde(
        default,
        deserialize_with = "flex::opt_switch",
        serialize_with = "flex::ser_opt_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub ignore: Option<bool>,
}

/// Link share segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareData {
    /// Share URL.
    #[serde(deserialize_with = "flex::string")]
    pub url: String,
    /// Share title.
    #[serde(deserialize_with = "flex::string")]
    pub title: String,
    /// Share content/description.
    #[serde(deserialize_with = "flex::string")]
    pub content: String,
    /// Share image URL.
    #[serde(deserialize_with = "flex::string")]
    pub image: String,
}

/// Contact recommendation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    /// A friend.
    Qq,
    /// A group.
    Group,
}

impl ContactType {
    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ContactType::Qq => "qq",
            ContactType::Group => "group",
        }
    }
}

/// Contact recommendation segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactData {
    /// Contact type: `qq` or `group`.
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    /// QQ number or group ID.
    #[serde(deserialize_with = "flex::int")]
    pub id: i64,
}

/// Location segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationData {
    /// Latitude.
    #[serde(deserialize_with = "flex::float")]
    pub lat: f64,
    /// Longitude.
    #[serde(deserialize_with = "flex::float")]
    pub lon: f64,
    /// Location title.
    #[serde(
        default,
        deserialize_with = "flex::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    /// Location content/description.
    #[serde(
        default,
        deserialize_with = "flex::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
}

/// Music platform for platform music shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicPlatform {
    /// QQ Music.
    #[serde(rename = "qq")]
    Qq,
    /// NetEase Cloud Music.
    #[serde(rename = "163")]
    NetEase,
    /// Xiami Music.
    #[serde(rename = "xm")]
    Xiami,
}

/// The `"custom"` tag of a custom music share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MusicCustomTag {
    /// The only value.
    #[default]
    #[serde(rename = "custom")]
    Custom,
}

/// Music share segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MusicData {
    /// A track on a supported platform.
    Platform(MusicPlatformData),
    /// A custom share with explicit URLs.
    Custom(MusicCustomData),
}

/// Platform music share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MusicPlatformData {
    /// Platform: `qq`, `163` or `xm`.
    #[serde(rename = "type")]
    pub platform: MusicPlatform,
    /// Track ID.
    #[serde(deserialize_with = "flex::string")]
    pub id: String,
}

/// Custom music share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MusicCustomData {
    /// Always `custom`.
    #[serde(rename = "type")]
    pub kind: MusicCustomTag,
    /// Click-through URL.
    #[serde(deserialize_with = "flex::string")]
    pub url: String,
    /// Audio URL.
    #[serde(deserialize_with = "flex::string")]
    pub audio: String,
    /// Title.
    #[serde(deserialize_with = "flex::string")]
    pub title: String,
    /// Description.
    #[serde(
        default,
        deserialize_with = "flex::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
    /// Cover image URL.
    #[serde(
        default,
        deserialize_with = "flex::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
}

/// Reply segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyData {
    /// Message ID to reply to.
    #[serde(deserialize_with = "flex::string")]
    pub id: String,
}

/// Forward reference segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardData {
    /// Forward message ID.
    #[serde(deserialize_with = "flex::string")]
    pub id: String,
}

/// Forward node segment data.
///
/// Exactly one of the three shapes; decoding rejects records that mix an
/// `id` with custom content, or that carry neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeData {
    /// Reference an existing message by ID.
    Reference(NodeRefData),
    /// Custom node with `user_id`/`nickname`.
    Custom(NodeCustomData),
    /// Custom node with `uin`/`name` (go-cqhttp spelling).
    Legacy(NodeLegacyData),
}

impl NodeData {
    /// Returns the embedded content of a custom node.
    pub fn content(&self) -> Option<&[Segment]> {
        match self {
            NodeData::Reference(_) => None,
            NodeData::Custom(d) => Some(&d.content),
            NodeData::Legacy(d) => Some(&d.content),
        }
    }
}

/// Reference node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRefData {
    /// Message ID.
    pub id: String,
}

/// Custom node, standard key names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCustomData {
    /// Sender user ID.
    pub user_id: i64,
    /// Sender nickname.
    pub nickname: String,
    /// Embedded message.
    pub content: Vec<Segment>,
}

/// Custom node, go-cqhttp key names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLegacyData {
    /// Sender user ID.
    pub uin: i64,
    /// Sender nickname.
    pub name: String,
    /// Embedded message.
    pub content: Vec<Segment>,
}

/// XML message segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XmlData {
    /// XML content.
    #[serde(deserialize_with = "flex::string")]
    pub data: String,
}

/// JSON message segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonData {
    /// JSON content.
    #[serde(deserialize_with = "flex::string")]
    pub data: String,
}

/// A segment of a kind outside the built-in set.
///
/// Only the registry creates these, after validating `data` against the
/// registered shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomSegment {
    kind: String,
    data: Map<String, Value>,
}

impl CustomSegment {
    pub(crate) fn new(kind: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Returns the discriminator.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the validated field record.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns a single field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_segment_serialize() {
        let text = Segment::text("Hello");
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, r#"{"type":"text","data":{"text":"Hello"}}"#);

        let at = Segment::at(10001000);
        let json = serde_json::to_string(&at).unwrap();
        assert_eq!(json, r#"{"type":"at","data":{"qq":10001000}}"#);

        let face = Segment::face(178);
        let json = serde_json::to_string(&face).unwrap();
        assert_eq!(json, r#"{"type":"face","data":{"id":178}}"#);

        assert_eq!(
            serde_json::to_value(Segment::at_all()).unwrap(),
            json!({"type": "at", "data": {"qq": "all"}})
        );
        assert_eq!(
            serde_json::to_value(Segment::rps()).unwrap(),
            json!({"type": "rps", "data": {}})
        );
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let value = serde_json::to_value(Segment::image("a.jpg")).unwrap();
        assert_eq!(value, json!({"type": "image", "data": {"file": "a.jpg"}}));

        let value = serde_json::to_value(Segment::flash_image("a.jpg")).unwrap();
        assert_eq!(
            value,
            json!({"type": "image", "data": {"file": "a.jpg", "type": "flash"}})
        );
    }

    #[test]
    fn test_switches_serialize_as_integers() {
        let seg = Segment::Image(ImageData::Send(ImageSendData {
            cache: Some(false),
            proxy: Some(true),
            ..ImageSendData::new("a.jpg")
        }));
        assert_eq!(
            seg.data_map(),
            json!({"file": "a.jpg", "cache": 0, "proxy": 1})
                .as_object()
                .cloned()
                .unwrap()
        );
    }

    #[test]
    fn test_node_shapes_serialize_with_their_own_keys() {
        let node = Segment::node_legacy(10001, "Alice", [Segment::text("hi")]);
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({"type": "node", "data": {
                "uin": 10001,
                "name": "Alice",
                "content": [{"type": "text", "data": {"text": "hi"}}]
            }})
        );

        let node = Segment::node_ref("abc");
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({"type": "node", "data": {"id": "abc"}})
        );
    }

    #[test]
    fn test_music_shapes() {
        let seg = Segment::music(MusicPlatform::NetEase, "28949129");
        assert_eq!(
            seg.data_map().get("type"),
            Some(&Value::String("163".to_string()))
        );

        let seg = Segment::music_custom("http://a", "http://b", "song");
        assert_eq!(
            serde_json::to_value(&seg).unwrap()["data"]["type"],
            json!("custom")
        );
    }

    #[test]
    fn test_kind_and_text() {
        let text = Segment::text("Hello");
        assert_eq!(text.kind(), "text");
        assert!(text.is_text());
        assert_eq!(text.as_text(), Some("Hello"));

        let image = Segment::image("test.jpg");
        assert_eq!(image.kind(), "image");
        assert!(!image.is_text());
        assert_eq!(image.as_text(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Segment::at_all().to_string(), "@全体成员");
        assert_eq!(Segment::at(123).to_string(), "@123");
        assert_eq!(Segment::text("hi").to_string(), "hi");
    }
}
