//! Data models for the OneBot v11 protocol.
//!
//! This module contains the segment model and its registry, the two message
//! wire forms, and the action, echo and event envelopes.

pub mod action;
pub mod echo;
pub mod escape;
pub mod event;
pub mod flex;
pub mod message;
pub mod registry;
pub mod segment;
pub mod types;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CodecError, CodecResult};

pub use action::{Action, MessageTarget};
pub use echo::{Echo, EchoData, EchoKind, EchoStatus, decode_echo};
pub use escape::{escape, unescape};
pub use event::{Event, PostType, decode_event};
pub use message::{
    Message, decode_array, decode_inline, decode_value, encode_array, encode_inline,
    filter_inline_text,
};
pub use registry::{FieldSpec, FieldType, SegmentRegistry, SegmentShape};
pub use segment::{
    AnonymousData, AtData, AtTarget, ContactData, CustomSegment, DiceData, FaceData, ForwardData,
    ImageData, JsonData, LocationData, MusicData, NodeData, PokeData, RecordData, ReplyData,
    RpsData, Segment, ShakeData, ShareData, TextData, VideoData, XmlData,
};
pub use types::{Anonymous, MessageSender, MessageType};

/// Deserializes `value`, reporting failure as a schema violation in `context`.
pub(crate) fn from_value<T: DeserializeOwned>(
    context: impl Into<String>,
    value: Value,
) -> CodecResult<T> {
    serde_json::from_value(value).map_err(|err| CodecError::schema(context, err))
}
