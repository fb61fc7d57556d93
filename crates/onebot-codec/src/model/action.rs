//! Outbound actions.
//!
//! An [`Action`] is the command envelope sent to the OneBot implementation:
//!
//! ```json
//! {"action": "send_msg", "params": {...}, "echo": "<action id>"}
//! ```
//!
//! The `echo` key is present only when the caller asked for a correlated
//! reply, and always carries the action's own id.
//!
//! # Example
//!
//! ```rust
//! use onebot_codec::{Action, MessageTarget, Segment, UuidIdGenerator};
//!
//! let action = Action::send_message(
//!     [Segment::text("hi")],
//!     MessageTarget::Private { user_id: 12345 },
//!     true,
//!     &UuidIdGenerator,
//!     None,
//! )
//! .unwrap();
//! let wire = action.to_value().unwrap();
//! assert_eq!(wire["echo"], action.id());
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use super::echo::EchoKind;
use super::message::{encode_array, json_kind};
use super::segment::{NodeData, Segment};
use crate::context::{EventRef, IdGenerator, UuidIdGenerator};
use crate::error::{CodecError, CodecResult};

/// Where a message is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    /// A user, by QQ number.
    Private {
        /// Target user.
        user_id: i64,
    },
    /// A group, by group number.
    Group {
        /// Target group.
        group_id: i64,
    },
}

/// An outbound command.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    time: i64,
    id: String,
    trigger: Option<EventRef>,
    kind: String,
    params: Map<String, Value>,
    need_echo: bool,
}

impl Action {
    /// Builds an action with a fresh id, stamped with the current time.
    ///
    /// `params` must serialize to a JSON object.
    pub fn build(
        kind: impl Into<String>,
        params: impl Serialize,
        want_echo: bool,
        ids: &dyn IdGenerator,
        trigger: Option<EventRef>,
    ) -> CodecResult<Self> {
        let kind = kind.into();
        let params = match serde_json::to_value(params)? {
            Value::Object(params) => params,
            other => {
                return Err(CodecError::schema(
                    format!("action {kind}"),
                    format!("params must be an object, got {}", json_kind(&other)),
                ));
            }
        };
        Ok(Self {
            time: unix_now(),
            id: ids.next_id(),
            trigger,
            kind,
            params,
            need_echo: want_echo,
        })
    }

    /// Builds a fire-and-forget action with a UUID id and no trigger.
    pub fn new(kind: impl Into<String>, params: impl Serialize) -> CodecResult<Self> {
        Self::build(kind, params, false, &UuidIdGenerator, None)
    }

    /// Builds a `send_msg` action.
    ///
    /// `auto_escape` is always `false`: the message is a segment list, not
    /// text for the server to parse.
    pub fn send_message(
        segments: impl IntoIterator<Item = Segment>,
        target: MessageTarget,
        want_echo: bool,
        ids: &dyn IdGenerator,
        trigger: Option<EventRef>,
    ) -> CodecResult<Self> {
        let segments: Vec<Segment> = segments.into_iter().collect();
        let message = encode_array(&segments)?;
        let params = match target {
            MessageTarget::Private { user_id } => json!({
                "message_type": "private",
                "user_id": user_id,
                "message": message,
                "auto_escape": false,
            }),
            MessageTarget::Group { group_id } => json!({
                "message_type": "group",
                "group_id": group_id,
                "message": message,
                "auto_escape": false,
            }),
        };
        Self::build("send_msg", params, want_echo, ids, trigger)
    }

    /// Builds a `send_private_forward_msg` or `send_group_forward_msg` action.
    pub fn send_forward_message(
        nodes: impl IntoIterator<Item = NodeData>,
        target: MessageTarget,
        want_echo: bool,
        ids: &dyn IdGenerator,
        trigger: Option<EventRef>,
    ) -> CodecResult<Self> {
        let nodes: Vec<Segment> = nodes.into_iter().map(Segment::Node).collect();
        let messages = encode_array(&nodes)?;
        let (kind, params) = match target {
            MessageTarget::Private { user_id } => (
                "send_private_forward_msg",
                json!({"user_id": user_id, "messages": messages, "auto_escape": false}),
            ),
            MessageTarget::Group { group_id } => (
                "send_group_forward_msg",
                json!({"group_id": group_id, "messages": messages, "auto_escape": false}),
            ),
        };
        Self::build(kind, params, want_echo, ids, trigger)
    }

    /// Creation time, in Unix seconds.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Process-unique id, used as the echo correlation key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The event this action responds to, for tracing.
    pub fn trigger(&self) -> Option<&EventRef> {
        self.trigger.as_ref()
    }

    /// The command name.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The parameter record.
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Whether a correlated reply is requested.
    pub fn need_echo(&self) -> bool {
        self.need_echo
    }

    /// Sets whether a correlated reply is requested.
    pub fn set_echo(&mut self, want_echo: bool) {
        self.need_echo = want_echo;
    }

    /// The reply shape expected for this command.
    pub fn echo_kind(&self) -> EchoKind {
        EchoKind::for_action(&self.kind)
    }

    /// Returns the wire form as a JSON value.
    pub fn to_value(&self) -> CodecResult<Value> {
        serde_json::to_value(self).map_err(CodecError::from)
    }

    /// Returns the wire form as compact JSON text.
    pub fn to_json_string(&self) -> CodecResult<String> {
        serde_json::to_string(self).map_err(CodecError::from)
    }
}

#[derive(Serialize)]
struct WireAction<'a> {
    action: &'a str,
    params: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    echo: Option<&'a str>,
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireAction {
            action: &self.kind,
            params: &self.params,
            echo: self.need_echo.then_some(self.id.as_str()),
        }
        .serialize(serializer)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
