//! The codec facade.
//!
//! A [`Codec`] bundles the frozen segment registry, the codec configuration
//! and the id source, and exposes every encode/decode operation on top of
//! them. It is cheap to clone and safe to share between tasks.
//!
//! ```rust
//! use onebot_codec::{Codec, FieldType, SegmentShape};
//! use serde_json::json;
//!
//! let codec = Codec::builder()
//!     .register("mface", SegmentShape::new().required("emoji_id", FieldType::String))
//!     .unwrap()
//!     .build();
//!
//! let segments = codec.decode_inline("hi[CQ:mface,emoji_id=abc]").unwrap();
//! assert_eq!(segments[1].kind(), "mface");
//! assert_eq!(codec.encode_inline(&segments), "hi[CQ:mface,emoji_id=abc]");
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::CodecConfig;
use crate::context::{EventRef, IdGenerator, UuidIdGenerator};
use crate::error::CodecResult;
use crate::model::action::{Action, MessageTarget};
use crate::model::echo::{self, Echo, EchoKind};
use crate::model::event::{self, Event};
use crate::model::message;
use crate::model::registry::{SegmentRegistry, SegmentShape};
use crate::model::segment::{NodeData, Segment};

/// Shared entry point for every codec operation.
#[derive(Clone)]
pub struct Codec {
    registry: Arc<SegmentRegistry>,
    config: CodecConfig,
    ids: Arc<dyn IdGenerator>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("kinds", &self.registry.kinds().count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(SegmentRegistry::new(), CodecConfig::default())
    }
}

impl Codec {
    /// Freezes `registry` and pairs it with `config` and UUID ids.
    pub fn new(registry: SegmentRegistry, config: CodecConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
            ids: Arc::new(UuidIdGenerator),
        }
    }

    /// Creates a builder starting from the built-in kinds.
    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }

    /// Returns the frozen registry.
    pub fn registry(&self) -> &SegmentRegistry {
        &self.registry
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Segments
    // ------------------------------------------------------------------------

    /// Decodes a message field in either wire form.
    pub fn decode_segments(&self, value: Value) -> CodecResult<Vec<Segment>> {
        message::decode_value(&self.registry, &self.config, value)
    }

    /// Decodes a list of `{type, data}` records.
    pub fn decode_array(&self, records: Vec<Value>) -> CodecResult<Vec<Segment>> {
        message::decode_array(&self.registry, &self.config, records)
    }

    /// Decodes an inline string.
    pub fn decode_inline(&self, inline: &str) -> CodecResult<Vec<Segment>> {
        message::decode_inline(&self.registry, &self.config, inline)
    }

    /// Encodes segments as `{type, data}` records.
    pub fn encode_array(&self, segments: &[Segment]) -> CodecResult<Vec<Value>> {
        message::encode_array(segments)
    }

    /// Encodes segments as an inline string.
    pub fn encode_inline(&self, segments: &[Segment]) -> String {
        message::encode_inline(segments)
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Builds an action with an id from this codec's generator.
    pub fn action(
        &self,
        kind: impl Into<String>,
        params: impl Serialize,
        want_echo: bool,
        trigger: Option<EventRef>,
    ) -> CodecResult<Action> {
        Action::build(kind, params, want_echo, self.ids.as_ref(), trigger)
    }

    /// Builds a `send_msg` action.
    pub fn send_message(
        &self,
        segments: impl IntoIterator<Item = Segment>,
        target: MessageTarget,
        want_echo: bool,
        trigger: Option<EventRef>,
    ) -> CodecResult<Action> {
        Action::send_message(segments, target, want_echo, self.ids.as_ref(), trigger)
    }

    /// Builds a forward-message action.
    pub fn send_forward_message(
        &self,
        nodes: impl IntoIterator<Item = NodeData>,
        target: MessageTarget,
        want_echo: bool,
        trigger: Option<EventRef>,
    ) -> CodecResult<Action> {
        Action::send_forward_message(nodes, target, want_echo, self.ids.as_ref(), trigger)
    }

    // ------------------------------------------------------------------------
    // Echoes and events
    // ------------------------------------------------------------------------

    /// Decodes a reply, narrowing `data` to `kind`.
    pub fn decode_echo(&self, raw: Value, kind: EchoKind) -> CodecResult<Echo> {
        echo::decode_echo(&self.registry, &self.config, self.ids.as_ref(), raw, kind)
    }

    /// Decodes a reply to the command named `action`.
    pub fn decode_echo_for(&self, raw: Value, action: &str) -> CodecResult<Echo> {
        self.decode_echo(raw, EchoKind::for_action(action))
    }

    /// Decodes a reply from raw JSON text.
    pub fn decode_echo_str(&self, text: &str, kind: EchoKind) -> CodecResult<Echo> {
        self.decode_echo(serde_json::from_str(text)?, kind)
    }

    /// Decodes an inbound event.
    pub fn decode_event(&self, raw: Value) -> CodecResult<Event> {
        event::decode_event(&self.registry, &self.config, raw)
    }

    /// Decodes an inbound event from raw JSON text.
    pub fn decode_event_str(&self, text: &str) -> CodecResult<Event> {
        self.decode_event(serde_json::from_str(text)?)
    }
}

/// Builder for [`Codec`].
///
/// Registration happens here, before the registry is frozen.
pub struct CodecBuilder {
    registry: SegmentRegistry,
    config: CodecConfig,
    ids: Arc<dyn IdGenerator>,
}

impl fmt::Debug for CodecBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecBuilder")
            .field("kinds", &self.registry.kinds().count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for CodecBuilder {
    fn default() -> Self {
        Self {
            registry: SegmentRegistry::new(),
            config: CodecConfig::default(),
            ids: Arc::new(UuidIdGenerator),
        }
    }
}

impl CodecBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the id source for actions and echoes.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Registers an extension segment kind.
    pub fn register(mut self, kind: impl Into<String>, shape: SegmentShape) -> CodecResult<Self> {
        self.registry.register(kind, shape)?;
        Ok(self)
    }

    /// Registers an extension segment kind from its JSON description.
    pub fn register_from_json(mut self, description: &Value) -> CodecResult<Self> {
        self.registry.register_from_json(description)?;
        Ok(self)
    }

    /// Freezes the registry and builds the codec.
    pub fn build(self) -> Codec {
        Codec {
            registry: Arc::new(self.registry),
            config: self.config,
            ids: self.ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::SequentialIdGenerator;
    use crate::error::CodecError;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_codec_is_shareable() {
        assert_send_sync::<Codec>();
    }

    #[test]
    fn test_builder_uses_id_generator() {
        let codec = Codec::builder()
            .id_generator(SequentialIdGenerator::new("x-"))
            .build();
        let action = codec.action("get_status", json!({}), true, None).unwrap();
        assert_eq!(action.id(), "x-1");
        let echo = codec
            .decode_echo_for(json!({"status": "async", "retcode": 1, "data": null}), "get_status")
            .unwrap();
        assert_eq!(echo.id, "x-2");
    }

    #[test]
    fn test_builder_rejects_bad_registration() {
        let err = Codec::builder()
            .register("text", SegmentShape::new())
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidVariantSpec { .. }));
    }

    #[test]
    fn test_str_entry_points() {
        let codec = Codec::default();
        let err = codec.decode_event_str("{not json").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));

        let echo = codec
            .decode_echo_str(r#"{"status":"ok","retcode":0,"data":{"yes":true}}"#, EchoKind::CanSendImage)
            .unwrap();
        assert!(echo.ok());
    }
}
