//! OneBot v11 Message type and wire codecs.
//!
//! This module provides the [`Message`] type, an ordered sequence of
//! [`Segment`]s, and the two encodings a message travels in.
//!
//! # Message Formats
//!
//! OneBot v11 supports two message formats:
//! - **Array format**: A JSON array of `{type, data}` segment records (recommended)
//! - **String format**: CQ-coded string (legacy, for compatibility)
//!
//! Both decode to the same segments. Inline field values that look like
//! numbers are coerced into JSON numbers (`"10"` → `10`, `"10.5"` → `10.5`)
//! unless [`CodecConfig::coerce_inline_numbers`] is off.
//!
//! # Example
//!
//! ```rust
//! use onebot_codec::{CodecConfig, Message, SegmentRegistry, Segment};
//! use onebot_codec::model::message::decode_inline;
//!
//! let registry = SegmentRegistry::new();
//! let segments = decode_inline(&registry, &CodecConfig::default(), "hi [CQ:face,id=178]").unwrap();
//! assert_eq!(segments, vec![Segment::text("hi "), Segment::face(178)]);
//!
//! let msg = Message::new().text("Hello, ").at(10001000);
//! assert_eq!(msg.to_inline(), "Hello, [CQ:at,qq=10001000]");
//! ```

use serde::Serialize;
use serde_json::{Number, Value};
use tracing::trace;

use super::escape::{escape, unescape};
use super::registry::SegmentRegistry;
use super::segment::{AtTarget, Segment};
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};

const GROUP_OPEN: &str = "[CQ:";

// ============================================================================
// Message - An ordered list of segments
// ============================================================================

/// A OneBot v11 message composed of multiple segments.
///
/// Segment order is display order. Serializes to the array form.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Message {
    segments: Vec<Segment>,
}

// ============================================================================
// Constructors and Builders
// ============================================================================

impl Message {
    /// Creates a new empty message.
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Creates a message from a vector of segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Creates a message containing only plain text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::text(text)],
        }
    }

    // --------------------------------
    // Builder methods
    // --------------------------------

    /// Adds a text segment to the message.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::text(text));
        self
    }

    /// Adds a face/emoji segment.
    pub fn face(mut self, id: i64) -> Self {
        self.segments.push(Segment::face(id));
        self
    }

    /// Adds an image segment.
    pub fn image(mut self, file: impl Into<String>) -> Self {
        self.segments.push(Segment::image(file));
        self
    }

    /// Adds a record/voice segment.
    pub fn record(mut self, file: impl Into<String>) -> Self {
        self.segments.push(Segment::record(file));
        self
    }

    /// Adds an @mention segment.
    pub fn at(mut self, qq: i64) -> Self {
        self.segments.push(Segment::at(qq));
        self
    }

    /// Adds an @all segment.
    pub fn at_all(mut self) -> Self {
        self.segments.push(Segment::at_all());
        self
    }

    /// Adds a reply segment.
    pub fn reply(mut self, id: impl Into<String>) -> Self {
        self.segments.push(Segment::reply(id));
        self
    }

    /// Adds a custom segment.
    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Appends multiple segments.
    pub fn append_segments(mut self, segments: impl IntoIterator<Item = Segment>) -> Self {
        self.segments.extend(segments);
        self
    }

    // --------------------------------
    // Mutable methods
    // --------------------------------

    /// Pushes a segment.
    pub fn push(&mut self, segment: Segment) -> &mut Self {
        self.segments.push(segment);
        self
    }

    /// Pushes a text segment.
    pub fn push_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.segments.push(Segment::text(text));
        self
    }

    /// Extends with multiple segments.
    pub fn extend(&mut self, segments: impl IntoIterator<Item = Segment>) -> &mut Self {
        self.segments.extend(segments);
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl Message {
    /// Returns the segments as a slice.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Converts the message into a vector of segments.
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Returns an iterator over the segments.
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the message has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenates the content of every text segment.
    pub fn plain_text(&self) -> String {
        self.segments.iter().filter_map(Segment::as_text).collect()
    }

    /// Converts the message to the inline string form.
    pub fn to_inline(&self) -> String {
        encode_inline(&self.segments)
    }

    /// Returns the first text segment's content, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.segments.iter().find_map(Segment::as_text)
    }

    /// Checks if the message contains only text segments.
    pub fn is_plain_text(&self) -> bool {
        self.segments.iter().all(Segment::is_text)
    }

    /// Returns all @mention QQ numbers in the message.
    pub fn mentioned_users(&self) -> Vec<i64> {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::At(data) => match data.qq {
                    AtTarget::User(id) => Some(id),
                    AtTarget::All => None,
                },
                _ => None,
            })
            .collect()
    }

    /// Checks if the message contains @all.
    pub fn mentions_all(&self) -> bool {
        self.segments
            .iter()
            .any(|seg| matches!(seg, Segment::At(data) if data.qq == AtTarget::All))
    }

    /// Gets the reply message ID if this is a reply.
    pub fn reply_to(&self) -> Option<&str> {
        self.segments.iter().find_map(|seg| {
            if let Segment::Reply(data) = seg {
                Some(data.id.as_str())
            } else {
                None
            }
        })
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<Vec<Segment>> for Message {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl From<Segment> for Message {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl FromIterator<Segment> for Message {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Message {
    type Item = Segment;
    type IntoIter = std::vec::IntoIter<Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

// ============================================================================
// Array Form
// ============================================================================

/// Decodes a list of `{type, data}` records.
pub fn decode_array(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    records: Vec<Value>,
) -> CodecResult<Vec<Segment>> {
    records
        .into_iter()
        .map(|record| registry.decode(config, record))
        .collect()
}

/// Encodes segments as a list of `{type, data}` records.
///
/// Absent optional fields are omitted.
pub fn encode_array(segments: &[Segment]) -> CodecResult<Vec<Value>> {
    segments
        .iter()
        .map(|seg| serde_json::to_value(seg).map_err(CodecError::from))
        .collect()
}

/// Decodes a message field that may be in either form.
///
/// A JSON string is parsed as inline; an array as records.
pub fn decode_value(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    value: Value,
) -> CodecResult<Vec<Segment>> {
    match value {
        Value::String(inline) => decode_inline(registry, config, &inline),
        Value::Array(records) => decode_array(registry, config, records),
        other => Err(CodecError::schema(
            "message",
            format!("expected a string or an array, got {}", json_kind(&other)),
        )),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// CQ Code Form
// ============================================================================

/// Encodes segments as a CQ code string.
///
/// Text segments are written out as their literal content, without
/// escaping. Every other segment becomes `[CQ:type,key=value,...]` with
/// escaped values in field order.
pub fn encode_inline(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        write_inline(segment, &mut out);
    }
    out
}

fn write_inline(segment: &Segment, out: &mut String) {
    if let Some(text) = segment.as_text() {
        out.push_str(text);
        return;
    }

    out.push_str(GROUP_OPEN);
    out.push_str(segment.kind());
    for (key, value) in segment.data_map() {
        let value = match (segment, key.as_str(), value) {
            (_, _, Value::Null) => continue,
            (Segment::Node(node), "content", _) => match node.content() {
                Some(content) => encode_inline(content),
                None => continue,
            },
            (_, _, Value::String(s)) => s,
            (_, _, other) => other.to_string(),
        };
        out.push(',');
        out.push_str(&key);
        out.push('=');
        out.push_str(&escape(&value));
    }
    out.push(']');
}

/// Parses a CQ code string into segments.
///
/// Runs outside `[CQ:...]` groups become text segments verbatim. Inside a
/// group, values are unescaped and (by default) numerically coerced before
/// being validated against the registry.
///
/// ```text
/// Hello [CQ:face,id=178] World [CQ:at,qq=10001000]
/// ```
pub fn decode_inline(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    input: &str,
) -> CodecResult<Vec<Segment>> {
    trace!(input, "Decoding inline message");

    let mut segments = Vec::new();
    let mut rest = input;
    let mut offset = 0;

    while !rest.is_empty() {
        let Some(start) = rest.find(GROUP_OPEN) else {
            segments.push(Segment::text(rest));
            break;
        };
        if start > 0 {
            segments.push(Segment::text(&rest[..start]));
        }

        let body_start = start + GROUP_OPEN.len();
        let body = &rest[body_start..];
        let end = body
            .find(']')
            .ok_or_else(|| CodecError::parse(offset + start, "unterminated `[CQ:` group"))?;
        segments.push(decode_group(
            registry,
            config,
            &body[..end],
            offset + body_start,
        )?);

        let consumed = body_start + end + 1;
        rest = &rest[consumed..];
        offset += consumed;
    }

    Ok(segments)
}

fn decode_group(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    body: &str,
    position: usize,
) -> CodecResult<Segment> {
    let mut parts = body.split(',');
    let kind = parts.next().unwrap_or_default();
    if kind.is_empty() {
        return Err(CodecError::parse(position, "empty segment type"));
    }

    let mut data = serde_json::Map::new();
    let mut cursor = position + kind.len() + 1;
    for pair in parts {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| CodecError::parse(cursor, format!("expected `key=value`, got `{pair}`")))?;
        if key.is_empty() {
            return Err(CodecError::parse(cursor, "empty key"));
        }

        let value = if kind == "text" {
            raw.to_string()
        } else {
            unescape(raw)
        };
        // Node content is a nested inline message and stays text.
        let value = if config.coerce_inline_numbers && !(kind == "node" && key == "content") {
            coerce(value)
        } else {
            Value::String(value)
        };
        data.insert(key.to_string(), value);
        cursor += pair.len() + 1;
    }

    registry.decode_kind(config, kind, Value::Object(data))
}

/// Converts a numeric-looking inline value into a JSON number.
///
/// Integral values become integers; other finite numbers become floats.
/// Anything else, including integers too large for `i64`, stays a string.
pub fn coerce(value: String) -> Value {
    if let Ok(int) = value.parse::<i64>() {
        return Value::from(int);
    }
    match value.parse::<f64>() {
        Ok(float) if float.is_finite() => {
            if float.fract() == 0.0 {
                if float >= i64::MIN as f64 && float < i64::MAX as f64 {
                    Value::from(float as i64)
                } else {
                    Value::String(value)
                }
            } else {
                Number::from_f64(float).map_or(Value::String(value), Value::Number)
            }
        }
        _ => Value::String(value),
    }
}

/// Strips every CQ code group, keeping only the literal text runs.
pub fn filter_inline_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(GROUP_OPEN) {
        out.push_str(&rest[..start]);
        match rest[start..].find(']') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                rest = &rest[start..];
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::segment::{ImageData, ImageSendData, LocationData};

    fn inline(input: &str) -> CodecResult<Vec<Segment>> {
        decode_inline(&SegmentRegistry::new(), &CodecConfig::default(), input)
    }

    #[test]
    fn test_message_builder() {
        let msg = Message::new().text("Hello, ").at(10001000).text("!");

        assert_eq!(msg.len(), 3);
        assert_eq!(msg.plain_text(), "Hello, !");
    }

    #[test]
    fn test_message_serialize_array() {
        let msg = Message::new().text("Hello").face(178);
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"text","data":{"text":"Hello"}},{"type":"face","data":{"id":178}}]"#
        );
    }

    #[test]
    fn test_decode_inline() {
        let segments = inline("Hello [CQ:face,id=178] World").unwrap();
        assert_eq!(
            segments,
            vec![Segment::text("Hello "), Segment::face(178), Segment::text(" World")]
        );

        let segments = inline("[CQ:at,qq=10001000]你好[CQ:image,file=123.jpg]").unwrap();
        assert_eq!(segments.len(), 3);
        assert!(matches!(&segments[0], Segment::At(_)));
        assert_eq!(segments[1].as_text(), Some("你好"));
        assert!(matches!(&segments[2], Segment::Image(_)));
    }

    #[test]
    fn test_plain_runs_are_not_unescaped() {
        let segments = inline("&#91;escaped&#93; &amp; test").unwrap();
        assert_eq!(segments, vec![Segment::text("&#91;escaped&#93; &amp; test")]);
    }

    #[test]
    fn test_group_values_are_unescaped() {
        let segments = inline("[CQ:share,url=http://a?x=1&amp;y=2,title=a&#44;b,content=c,image=d]")
            .unwrap();
        let Segment::Share(share) = &segments[0] else {
            panic!("expected share")
        };
        assert_eq!(share.url, "http://a?x=1&y=2");
        assert_eq!(share.title, "a,b");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            inline("abc [CQ:face,id=1").unwrap_err(),
            CodecError::ParseError { position: 4, .. }
        ));
        assert!(matches!(
            inline("[CQ:]").unwrap_err(),
            CodecError::ParseError { .. }
        ));
        assert!(matches!(
            inline("[CQ:face,id]").unwrap_err(),
            CodecError::ParseError { .. }
        ));
        assert!(matches!(
            inline("[CQ:face,=1]").unwrap_err(),
            CodecError::ParseError { .. }
        ));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("10".to_string()), json!(10));
        assert_eq!(coerce("10.5".to_string()), json!(10.5));
        assert_eq!(coerce("10.0".to_string()), json!(10));
        assert_eq!(coerce("abc".to_string()), json!("abc"));
        assert_eq!(coerce("NaN".to_string()), json!("NaN"));
        assert_eq!(coerce("inf".to_string()), json!("inf"));
        assert_eq!(
            coerce("123456789012345678901234".to_string()),
            json!("123456789012345678901234")
        );
        assert_eq!(
            coerce("9007199254740993".to_string()),
            json!(9007199254740993_i64)
        );
    }

    #[test]
    fn test_coercion_can_be_disabled() {
        let mut registry = SegmentRegistry::new();
        registry
            .register(
                "tag",
                crate::model::registry::SegmentShape::new()
                    .required("value", crate::model::registry::FieldType::Any),
            )
            .unwrap();
        let config = CodecConfig {
            coerce_inline_numbers: false,
            ..CodecConfig::default()
        };
        let segments = decode_inline(&registry, &config, "[CQ:tag,value=10]").unwrap();
        let Segment::Custom(custom) = &segments[0] else {
            panic!("expected custom segment")
        };
        assert_eq!(custom.get("value"), Some(&json!("10")));
    }

    #[test]
    fn test_encode_inline() {
        let msg = Message::new().text("Hello ").face(178).text(" World");
        assert_eq!(msg.to_inline(), "Hello [CQ:face,id=178] World");

        assert_eq!(encode_inline(&[Segment::rps()]), "[CQ:rps]");
        assert_eq!(encode_inline(&[Segment::at_all()]), "[CQ:at,qq=all]");
        assert_eq!(
            encode_inline(&[Segment::share("http://x", "a,b", "[c]", "i&j")]),
            "[CQ:share,url=http://x,title=a&#44;b,content=&#91;c&#93;,image=i&amp;j]"
        );
    }

    #[test]
    fn test_text_is_emitted_unescaped() {
        // Text segments carry literal content; only group values are escaped.
        let segments = vec![Segment::text("a [b], &c")];
        assert_eq!(encode_inline(&segments), "a [b], &c");
        assert_eq!(inline(&encode_inline(&segments)).unwrap(), segments);

        // A text segment that spells a group does not survive the inline form.
        let segments = vec![Segment::text("[CQ:face,id=1]")];
        assert_ne!(inline(&encode_inline(&segments)).unwrap(), segments);
    }

    #[test]
    fn test_inline_round_trip() {
        let segments = vec![
            Segment::reply("42"),
            Segment::at(10001),
            Segment::text(" look: "),
            Segment::Image(ImageData::Send(ImageSendData {
                cache: Some(false),
                timeout: Some(30),
                ..ImageSendData::new("http://x/a.jpg?a=1,b=[2]")
            })),
            Segment::Location(LocationData {
                lat: 39.9,
                lon: 116.0,
                title: Some("here".to_string()),
                content: None,
            }),
            Segment::node_custom(10001, "Alice", [Segment::face(1)]),
        ];
        assert_eq!(inline(&encode_inline(&segments)).unwrap(), segments);
    }

    #[test]
    fn test_numeric_looking_strings_round_trip() {
        let segments = vec![
            Segment::xml("123"),
            Segment::json("4.5"),
            Segment::share("1", "2", "3", "4"),
            Segment::node_custom(1, "n", [Segment::text("10.0")]),
            Segment::node_legacy(2, "m", [Segment::text("007")]),
        ];
        assert_eq!(inline(&encode_inline(&segments)).unwrap(), segments);

        let segments = inline("[CQ:xml,data=123]").unwrap();
        assert_eq!(segments, vec![Segment::xml("123")]);
    }

    #[test]
    fn test_array_round_trip() {
        let segments = vec![
            Segment::text("hi"),
            Segment::at_all(),
            Segment::node_legacy(1, "n", [Segment::node_ref("7"), Segment::xml("<a/>")]),
            Segment::flash_image("f.png"),
        ];
        let encoded = encode_array(&segments).unwrap();
        let decoded =
            decode_array(&SegmentRegistry::new(), &CodecConfig::default(), encoded).unwrap();
        assert_eq!(decoded, segments);
    }

    #[test]
    fn test_decode_value() {
        let registry = SegmentRegistry::new();
        let config = CodecConfig::default();
        let from_string = decode_value(&registry, &config, json!("hi")).unwrap();
        let from_array = decode_value(
            &registry,
            &config,
            json!([{"type": "text", "data": {"text": "hi"}}]),
        )
        .unwrap();
        assert_eq!(from_string, from_array);

        assert!(decode_value(&registry, &config, json!({"text": "hi"})).is_err());
    }

    #[test]
    fn test_filter_inline_text() {
        assert_eq!(
            filter_inline_text("hello [CQ:at,qq=1] world[CQ:face,id=2]"),
            "hello  world"
        );
        assert_eq!(filter_inline_text("broken [CQ:at"), "broken [CQ:at");
    }

    #[test]
    fn test_mentioned_users() {
        let msg = Message::new()
            .at(10001000)
            .text(" and ")
            .at(10001001)
            .at_all();

        let users = msg.mentioned_users();
        assert_eq!(users, vec![10001000, 10001001]);
        assert!(msg.mentions_all());
    }

    #[test]
    fn test_reply_to() {
        let msg = Message::new().reply("12345").text("This is a reply");

        assert_eq!(msg.reply_to(), Some("12345"));
    }

    #[test]
    fn test_from_implementations() {
        let msg: Message = "Hello".into();
        assert_eq!(msg.plain_text(), "Hello");

        let msg: Message = Segment::face(178).into();
        assert_eq!(msg.len(), 1);

        let msg: Message = vec![Segment::text("A"), Segment::text("B")].into();
        assert_eq!(msg.len(), 2);
        assert!(msg.is_plain_text());
    }
}
