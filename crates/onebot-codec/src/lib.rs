//! # OneBot v11 Codec
//!
//! Wire codec for the OneBot v11 bot protocol.
//!
//! This crate turns raw JSON exchanged with a OneBot v11 implementation into
//! a typed model and back. It performs no I/O: transports hand it values or
//! text, and get values or text back.
//!
//! ## Layers
//!
//! - **Escape codec**: reversible escaping of inline text ([`model::escape`])
//! - **Segment registry**: discriminator → schema table, extensible at
//!   startup ([`SegmentRegistry`], [`SegmentShape`])
//! - **Message codec**: the `[{type, data}]` array form and the
//!   `[CQ:type,k=v]` inline form ([`Message`], [`model::message`])
//! - **Action encoder**: outbound `{action, params, echo?}` ([`Action`])
//! - **Echo decoder**: inbound `{status, retcode, data}` ([`Echo`])
//! - **Event decoder**: inbound events by `post_type` ([`Event`])
//!
//! ```text
//! raw JSON ──▶ Event / Echo decoder ──▶ typed model ──▶ application
//!                    │
//!                    └──▶ Segment registry (message fields)
//!
//! application ──▶ Action encoder ──▶ raw JSON ──▶ transport
//! ```
//!
//! ## Example
//!
//! ```rust
//! use onebot_codec::{Codec, Event, MessageTarget, Segment};
//! use serde_json::json;
//!
//! let codec = Codec::default();
//!
//! let event = codec
//!     .decode_event(json!({
//!         "time": 1, "self_id": 10, "post_type": "message",
//!         "message_type": "group", "sub_type": "normal",
//!         "message_id": 5, "user_id": 9, "group_id": 100,
//!         "message": "ping [CQ:at,qq=10]",
//!         "sender": {"user_id": 9}
//!     }))
//!     .unwrap();
//! let Event::Message(msg) = &event else { unreachable!() };
//! assert_eq!(msg.message.mentioned_users(), vec![10]);
//!
//! let reply = codec
//!     .send_message(
//!         [Segment::reply("5"), Segment::text("pong")],
//!         MessageTarget::Group { group_id: 100 },
//!         true,
//!         Some(event.to_ref()),
//!     )
//!     .unwrap();
//! assert_eq!(reply.to_value().unwrap()["action"], "send_msg");
//! ```
//!
//! ## Concurrency
//!
//! Decoding and encoding are pure functions of their input. The registry is
//! only mutable through `&mut`, so it is populated first and then frozen
//! inside a [`Codec`], which is `Send + Sync` and cheap to clone.

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod model;

pub use codec::{Codec, CodecBuilder};
pub use config::{CodecConfig, UnknownSegmentPolicy};
pub use context::{EventRef, IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use error::{CodecError, CodecResult};
pub use model::{
    Action, Echo, EchoData, EchoKind, EchoStatus, Event, FieldSpec, FieldType, Message,
    MessageTarget, PostType, Segment, SegmentRegistry, SegmentShape,
};
