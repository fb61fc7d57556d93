//! Segment variant registry.
//!
//! Maps each segment discriminator to the decoder that validates its field
//! record. The twenty built-in kinds are present from construction; further
//! kinds can be registered with a flat [`SegmentShape`] while the registry is
//! still exclusively owned.
//!
//! # Example
//!
//! ```rust
//! use onebot_codec::{FieldType, SegmentRegistry, SegmentShape};
//!
//! let mut registry = SegmentRegistry::new();
//! registry
//!     .register(
//!         "mface",
//!         SegmentShape::new()
//!             .required("emoji_id", FieldType::String)
//!             .optional("summary", FieldType::String),
//!     )
//!     .unwrap();
//! assert!(registry.contains("mface"));
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use super::flex;
use super::message;
use super::segment::{
    CustomSegment, NodeCustomData, NodeData, NodeLegacyData, NodeRefData, Segment,
};
use crate::config::{CodecConfig, UnknownSegmentPolicy};
use crate::error::{CodecError, CodecResult};

// ============================================================================
// Field shapes
// ============================================================================

/// Scalar type of a field in a registered segment kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A string. Numbers are accepted and stringified.
    String,
    /// An integer. Integral floats and numeric strings are accepted.
    Int,
    /// A number. Numeric strings are accepted.
    Float,
    /// A boolean. `0`/`1` and their string forms are accepted.
    Bool,
    /// Any JSON value, stored as-is.
    Any,
}

impl FieldType {
    /// Parses a type name used in JSON shape descriptions.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "str" => Some(Self::String),
            "int" | "integer" => Some(Self::Int),
            "float" | "number" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    fn normalize(self, value: Value) -> Option<Value> {
        match (self, value) {
            (Self::Any, v) => Some(v),
            (Self::String, Value::String(s)) => Some(Value::String(s)),
            (Self::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (Self::Int, Value::Number(n)) => {
                if n.is_i64() {
                    return Some(Value::Number(n));
                }
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                    .map(|f| Value::from(f as i64))
            }
            (Self::Int, Value::String(s)) => s.parse::<i64>().ok().map(Value::from),
            (Self::Float, Value::Number(n)) => Some(Value::Number(n)),
            (Self::Float, Value::String(s)) => s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (Self::Bool, Value::Bool(b)) => Some(Value::Bool(b)),
            (Self::Bool, Value::Number(n)) => match n.as_u64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            (Self::Bool, Value::String(s)) => match s.as_str() {
                "0" | "false" => Some(Value::Bool(false)),
                "1" | "true" => Some(Value::Bool(true)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Any => "any",
        })
    }
}

/// One field of a [`SegmentShape`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Key in the field record.
    pub name: String,
    /// Accepted value type.
    pub ty: FieldType,
    /// Whether the field must be present and non-null.
    pub required: bool,
}

/// Field-shape description for a registered segment kind.
///
/// Shapes are flat: every field holds a scalar. A closed shape (the default)
/// rejects fields it does not declare; an open shape keeps them verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentShape {
    fields: Vec<FieldSpec>,
    open: bool,
}

impl SegmentShape {
    /// Creates an empty, closed shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required field.
    pub fn required(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required: true,
        });
        self
    }

    /// Adds an optional field.
    pub fn optional(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required: false,
        });
        self
    }

    /// Keeps undeclared fields instead of rejecting them.
    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    /// Returns the declared fields.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn check(&self, kind: &str) -> CodecResult<()> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(CodecError::invalid_spec(kind, "empty field name"));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CodecError::invalid_spec(
                    kind,
                    format!("field '{}' declared twice", field.name),
                ));
            }
        }
        Ok(())
    }

    fn validate(&self, kind: &str, data: Value) -> CodecResult<Map<String, Value>> {
        let context = format!("segment '{kind}'");
        let Value::Object(mut input) = data else {
            return Err(CodecError::schema(context, "data is not an object"));
        };

        let mut output = Map::new();
        for field in &self.fields {
            match input.shift_remove(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(CodecError::schema(
                            context,
                            format!("missing field `{}`", field.name),
                        ));
                    }
                }
                Some(value) => {
                    let value = field.ty.normalize(value).ok_or_else(|| {
                        CodecError::schema(
                            &context,
                            format!("field `{}` expects {}", field.name, field.ty),
                        )
                    })?;
                    output.insert(field.name.clone(), value);
                }
            }
        }

        input.retain(|_, v| !v.is_null());
        if !input.is_empty() {
            if !self.open {
                let extra: Vec<&str> = input.keys().map(String::as_str).collect();
                return Err(CodecError::schema(
                    context,
                    format!("unknown field(s) `{}`", extra.join("`, `")),
                ));
            }
            output.extend(input);
        }
        Ok(output)
    }
}

// ============================================================================
// Registry
// ============================================================================

type BuiltinDecoder = fn(&SegmentRegistry, &CodecConfig, Value) -> CodecResult<Segment>;

#[derive(Debug, Clone)]
enum Descriptor {
    Builtin(BuiltinDecoder),
    Custom(SegmentShape),
}

/// Discriminator → decoder table for message segments.
///
/// Mutation requires `&mut self`; share the finished registry behind an
/// `Arc` so every decode sees the same frozen table.
#[derive(Debug, Clone)]
pub struct SegmentRegistry {
    variants: HashMap<String, Descriptor>,
}

impl Default for SegmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentRegistry {
    /// Creates a registry holding the built-in kinds.
    pub fn new() -> Self {
        let variants = BUILTINS
            .iter()
            .map(|(kind, decoder)| (kind.to_string(), Descriptor::Builtin(*decoder)))
            .collect();
        Self { variants }
    }

    /// Returns `true` if `kind` is one of the built-in kinds.
    pub fn is_builtin(kind: &str) -> bool {
        BUILTINS.iter().any(|(k, _)| *k == kind)
    }

    /// Returns `true` if `kind` can be decoded.
    pub fn contains(&self, kind: &str) -> bool {
        self.variants.contains_key(kind)
    }

    /// Iterates over every registered discriminator.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// Registers a new segment kind.
    ///
    /// Fails with [`CodecError::InvalidVariantSpec`] if the discriminator is
    /// empty, contains characters that cannot appear in an inline group, is
    /// already registered, or if the shape declares a field twice.
    pub fn register(&mut self, kind: impl Into<String>, shape: SegmentShape) -> CodecResult<()> {
        let kind = kind.into();
        let result = check_kind(&kind)
            .and_then(|()| {
                if self.contains(&kind) {
                    Err(CodecError::invalid_spec(&kind, "kind is already registered"))
                } else {
                    Ok(())
                }
            })
            .and_then(|()| shape.check(&kind));

        if let Err(err) = result {
            warn!(kind = %kind, error = %err, "Rejected segment registration");
            return Err(err);
        }

        debug!(kind = %kind, fields = shape.fields.len(), open = shape.open, "Registered segment kind");
        self.variants.insert(kind, Descriptor::Custom(shape));
        Ok(())
    }

    /// Registers a kind from a JSON description and returns its discriminator.
    ///
    /// ```json
    /// {
    ///   "type": "mface",
    ///   "fields": {
    ///     "emoji_id": "string",
    ///     "summary": { "type": "string", "required": false }
    ///   },
    ///   "open": false
    /// }
    /// ```
    ///
    /// `type` may also be a one-element array. Anything other than a single
    /// literal, or a field whose type is a nested record or list, is refused.
    pub fn register_from_json(&mut self, description: &Value) -> CodecResult<String> {
        let (kind, shape) = parse_description(description).inspect_err(|err| {
            warn!(error = %err, "Rejected segment registration");
        })?;
        self.register(kind.clone(), shape)?;
        Ok(kind)
    }

    /// Decodes one `{type, data}` record.
    pub fn decode(&self, config: &CodecConfig, record: Value) -> CodecResult<Segment> {
        let Value::Object(mut record) = record else {
            return Err(CodecError::schema("segment", "element is not an object"));
        };
        let kind = match record.shift_remove("type") {
            Some(Value::String(kind)) => kind,
            Some(_) => return Err(CodecError::schema("segment", "`type` is not a string")),
            None => return Err(CodecError::schema("segment", "missing field `type`")),
        };
        let data = match record.shift_remove("data") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(data) => data,
        };
        self.decode_kind(config, &kind, data)
    }

    /// Validates `data` against the shape registered for `kind`.
    pub fn decode_kind(
        &self,
        config: &CodecConfig,
        kind: &str,
        data: Value,
    ) -> CodecResult<Segment> {
        match self.variants.get(kind) {
            Some(Descriptor::Builtin(decoder)) => decoder(self, config, data),
            Some(Descriptor::Custom(shape)) => shape
                .validate(kind, data)
                .map(|data| Segment::Custom(CustomSegment::new(kind, data))),
            None => match config.unknown_segment {
                UnknownSegmentPolicy::Reject => Err(CodecError::UnknownSegmentKind {
                    kind: kind.to_string(),
                }),
                UnknownSegmentPolicy::PassThrough => {
                    warn!(kind, "Passing unknown segment kind through");
                    match data {
                        Value::Object(map) => Ok(Segment::Opaque(CustomSegment::new(kind, map))),
                        _ => Err(CodecError::schema(
                            format!("segment '{kind}'"),
                            "data is not an object",
                        )),
                    }
                }
            },
        }
    }

    /// Builds a segment of any registered kind from a field record.
    ///
    /// This is the checked constructor for registered custom kinds; unknown
    /// kinds are always refused here.
    pub fn build(&self, kind: &str, data: Map<String, Value>) -> CodecResult<Segment> {
        self.decode_kind(&CodecConfig::default(), kind, Value::Object(data))
    }
}

fn check_kind(kind: &str) -> CodecResult<()> {
    if kind.is_empty() {
        return Err(CodecError::invalid_spec(kind, "empty discriminator"));
    }
    if !kind
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(CodecError::invalid_spec(
            kind,
            "discriminator may only contain ASCII letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}

fn parse_description(description: &Value) -> CodecResult<(String, SegmentShape)> {
    let Value::Object(description) = description else {
        return Err(CodecError::invalid_spec("?", "description is not an object"));
    };

    let kind = match description.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(Value::Array(values)) => match values.as_slice() {
            [Value::String(kind)] => kind.clone(),
            _ => {
                return Err(CodecError::invalid_spec(
                    "?",
                    format!("discriminator must be exactly one literal, got {}", values.len()),
                ));
            }
        },
        _ => return Err(CodecError::invalid_spec("?", "missing string `type`")),
    };

    let mut shape = SegmentShape::new();
    if description.get("open").and_then(Value::as_bool) == Some(true) {
        shape = shape.open();
    }

    let fields = match description.get("fields") {
        None | Some(Value::Null) => return Ok((kind, shape)),
        Some(Value::Object(fields)) => fields,
        Some(_) => {
            return Err(CodecError::invalid_spec(&kind, "field shape is not a record"));
        }
    };

    for (name, spec) in fields {
        let (type_name, required) = match spec {
            Value::String(type_name) => (type_name.as_str(), true),
            Value::Object(spec) => match spec.get("type") {
                Some(Value::String(type_name)) => (
                    type_name.as_str(),
                    spec.get("required").and_then(Value::as_bool).unwrap_or(true),
                ),
                _ => {
                    return Err(CodecError::invalid_spec(
                        &kind,
                        format!("field `{name}` is not flat"),
                    ));
                }
            },
            _ => {
                return Err(CodecError::invalid_spec(
                    &kind,
                    format!("field `{name}` is not flat"),
                ));
            }
        };
        let ty = match type_name {
            "object" | "record" | "map" | "array" | "list" => {
                return Err(CodecError::invalid_spec(
                    &kind,
                    format!("field `{name}` is not flat: {type_name}"),
                ));
            }
            other => FieldType::from_name(other).ok_or_else(|| {
                CodecError::invalid_spec(&kind, format!("unknown type `{other}` for `{name}`"))
            })?,
        };
        shape = if required {
            shape.required(name.clone(), ty)
        } else {
            shape.optional(name.clone(), ty)
        };
    }
    Ok((kind, shape))
}

// ============================================================================
// Built-in decoders
// ============================================================================

fn typed<T: DeserializeOwned>(kind: &str, data: Value) -> CodecResult<T> {
    super::from_value(format!("segment '{kind}'"), data)
}

macro_rules! typed_decoder {
    ($($name:ident => $kind:literal, $variant:ident;)*) => {
        $(
            fn $name(_: &SegmentRegistry, _: &CodecConfig, data: Value) -> CodecResult<Segment> {
                typed($kind, data).map(Segment::$variant)
            }
        )*
    };
}

typed_decoder! {
    decode_text => "text", Text;
    decode_face => "face", Face;
    decode_image => "image", Image;
    decode_record => "record", Record;
    decode_video => "video", Video;
    decode_at => "at", At;
    decode_rps => "rps", Rps;
    decode_dice => "dice", Dice;
    decode_shake => "shake", Shake;
    decode_poke => "poke", Poke;
    decode_anonymous => "anonymous", Anonymous;
    decode_share => "share", Share;
    decode_contact => "contact", Contact;
    decode_location => "location", Location;
    decode_music => "music", Music;
    decode_reply => "reply", Reply;
    decode_forward => "forward", Forward;
    decode_xml => "xml", Xml;
    decode_json => "json", Json;
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    #[serde(default, deserialize_with = "flex::opt_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_int")]
    user_id: Option<i64>,
    #[serde(default, deserialize_with = "flex::opt_string")]
    nickname: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_int")]
    uin: Option<i64>,
    #[serde(default, deserialize_with = "flex::opt_string")]
    name: Option<String>,
    #[serde(default)]
    content: Option<Value>,
}

fn decode_node(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    data: Value,
) -> CodecResult<Segment> {
    decode_node_data(registry, config, data).map(Segment::Node)
}

/// Decodes a node field record into exactly one of the three node shapes.
pub(crate) fn decode_node_data(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    data: Value,
) -> CodecResult<NodeData> {
    let raw: RawNode = typed("node", data)?;
    let err = |reason: &str| CodecError::schema("segment 'node'", reason);

    match raw {
        RawNode {
            id: Some(id),
            user_id: None,
            nickname: None,
            uin: None,
            name: None,
            content: None,
        } => Ok(NodeData::Reference(NodeRefData { id })),
        RawNode { id: Some(_), .. } => Err(err("`id` cannot be combined with custom node fields")),
        RawNode {
            id: None,
            user_id: Some(user_id),
            nickname: Some(nickname),
            uin: None,
            name: None,
            content: Some(content),
        } => Ok(NodeData::Custom(NodeCustomData {
            user_id,
            nickname,
            content: node_content(registry, config, content)?,
        })),
        RawNode {
            id: None,
            user_id: None,
            nickname: None,
            uin: Some(uin),
            name: Some(name),
            content: Some(content),
        } => Ok(NodeData::Legacy(NodeLegacyData {
            uin,
            name,
            content: node_content(registry, config, content)?,
        })),
        _ => Err(err(
            "expected exactly one of `id`, `user_id`/`nickname`/`content` or `uin`/`name`/`content`",
        )),
    }
}

fn node_content(
    registry: &SegmentRegistry,
    config: &CodecConfig,
    content: Value,
) -> CodecResult<Vec<Segment>> {
    match content {
        Value::Number(n) => message::decode_inline(registry, config, &n.to_string()),
        other => message::decode_value(registry, config, other),
    }
}

const BUILTINS: [(&str, BuiltinDecoder); 20] = [
    ("text", decode_text),
    ("face", decode_face),
    ("image", decode_image),
    ("record", decode_record),
    ("video", decode_video),
    ("at", decode_at),
    ("rps", decode_rps),
    ("dice", decode_dice),
    ("shake", decode_shake),
    ("poke", decode_poke),
    ("anonymous", decode_anonymous),
    ("share", decode_share),
    ("contact", decode_contact),
    ("location", decode_location),
    ("music", decode_music),
    ("reply", decode_reply),
    ("forward", decode_forward),
    ("node", decode_node),
    ("xml", decode_xml),
    ("json", decode_json),
];

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::segment::{AtTarget, ImageData, MusicData, PokeData};

    fn decode(record: Value) -> CodecResult<Segment> {
        SegmentRegistry::new().decode(&CodecConfig::default(), record)
    }

    #[test]
    fn test_builtin_kinds() {
        let registry = SegmentRegistry::new();
        for kind in [
            "text", "face", "image", "record", "video", "at", "rps", "dice", "shake", "poke",
            "anonymous", "share", "contact", "location", "music", "reply", "forward", "node",
            "xml", "json",
        ] {
            assert!(registry.contains(kind), "{kind}");
            assert!(SegmentRegistry::is_builtin(kind));
        }
        assert_eq!(registry.kinds().count(), 20);
    }

    #[test]
    fn test_decode_builtin() {
        let seg = decode(json!({"type": "text", "data": {"text": "hi"}})).unwrap();
        assert_eq!(seg, Segment::text("hi"));

        let seg = decode(json!({"type": "at", "data": {"qq": "all"}})).unwrap();
        assert_eq!(seg, Segment::at_all());

        let seg = decode(json!({"type": "at", "data": {"qq": "10001"}})).unwrap();
        let Segment::At(at) = seg else { panic!() };
        assert_eq!(at.qq, AtTarget::User(10001));

        let seg = decode(json!({"type": "rps"})).unwrap();
        assert_eq!(seg, Segment::rps());
    }

    #[test]
    fn test_send_and_receive_shapes() {
        let seg = decode(json!({"type": "image", "data": {"file": "a.jpg", "cache": 0}})).unwrap();
        assert!(matches!(seg, Segment::Image(ImageData::Send(ref d)) if d.cache == Some(false)));

        let seg = decode(json!({"type": "image", "data": {"file": "a.jpg", "url": "http://x"}}))
            .unwrap();
        let Segment::Image(image) = seg else { panic!() };
        assert_eq!(image.url(), Some("http://x"));

        let seg = decode(json!({"type": "poke", "data": {"type": "1", "id": "-1", "name": "戳一戳"}}))
            .unwrap();
        assert!(matches!(seg, Segment::Poke(PokeData::Recv(_))));

        let seg = decode(json!({"type": "music", "data": {"type": "custom", "url": "u", "audio": "a", "title": "t"}}))
            .unwrap();
        assert!(matches!(seg, Segment::Music(MusicData::Custom(_))));
    }

    #[test]
    fn test_schema_violations() {
        let err = decode(json!({"type": "face", "data": {}})).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));

        let err = decode(json!({"type": "face", "data": {"id": 1, "extra": 2}})).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));

        let err = decode(json!({"type": "face", "data": {"id": {"nested": 1}}})).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));

        let err = decode(json!({"data": {}})).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));
    }

    #[test]
    fn test_node_exclusivity() {
        let both = json!({"type": "node", "data": {
            "id": "1", "uin": 10001, "name": "a", "content": "hi"
        }});
        assert!(matches!(
            decode(both).unwrap_err(),
            CodecError::SchemaViolation { .. }
        ));

        let neither = json!({"type": "node", "data": {}});
        assert!(matches!(
            decode(neither).unwrap_err(),
            CodecError::SchemaViolation { .. }
        ));

        let mixed = json!({"type": "node", "data": {
            "user_id": 1, "name": "a", "content": "hi"
        }});
        assert!(decode(mixed).is_err());

        let reference = decode(json!({"type": "node", "data": {"id": 123}})).unwrap();
        assert_eq!(reference, Segment::node_ref("123"));

        let legacy = decode(json!({"type": "node", "data": {
            "uin": "10001", "name": "Alice", "content": "hi [CQ:face,id=1]"
        }}))
        .unwrap();
        assert_eq!(
            legacy,
            Segment::node_legacy(10001, "Alice", [Segment::text("hi "), Segment::face(1)])
        );

        let custom = decode(json!({"type": "node", "data": {
            "user_id": 10001, "nickname": "Alice",
            "content": [{"type": "text", "data": {"text": "hi"}}]
        }}))
        .unwrap();
        assert_eq!(
            custom,
            Segment::node_custom(10001, "Alice", [Segment::text("hi")])
        );
    }

    #[test]
    fn test_unknown_kind_policy() {
        let record = json!({"type": "mface", "data": {"emoji_id": "x"}});
        let err = decode(record.clone()).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownSegmentKind {
                kind: "mface".to_string()
            }
        );

        let seg = SegmentRegistry::new()
            .decode(&CodecConfig::lenient(), record.clone())
            .unwrap();
        assert!(matches!(seg, Segment::Opaque(_)));
        assert_eq!(serde_json::to_value(&seg).unwrap(), record);
    }

    #[test]
    fn test_register_custom_kind() {
        let mut registry = SegmentRegistry::new();
        registry
            .register(
                "mface",
                SegmentShape::new()
                    .required("emoji_id", FieldType::String)
                    .optional("count", FieldType::Int),
            )
            .unwrap();

        let seg = registry
            .decode(
                &CodecConfig::default(),
                json!({"type": "mface", "data": {"emoji_id": 42, "count": "3"}}),
            )
            .unwrap();
        let Segment::Custom(custom) = &seg else {
            panic!("expected custom segment")
        };
        assert_eq!(custom.get("emoji_id"), Some(&json!("42")));
        assert_eq!(custom.get("count"), Some(&json!(3)));

        let err = registry
            .decode(
                &CodecConfig::default(),
                json!({"type": "mface", "data": {"emoji_id": "x", "other": 1}}),
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));

        let err = registry
            .decode(&CodecConfig::default(), json!({"type": "mface", "data": {}}))
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation { .. }));
    }

    #[test]
    fn test_open_shape_keeps_extra_fields() {
        let mut registry = SegmentRegistry::new();
        registry
            .register("markdown", SegmentShape::new().required("content", FieldType::String).open())
            .unwrap();
        let seg = registry
            .build(
                "markdown",
                json!({"content": "# hi", "style": 2})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            serde_json::to_value(&seg).unwrap(),
            json!({"type": "markdown", "data": {"content": "# hi", "style": 2}})
        );
    }

    #[test]
    fn test_invalid_registrations() {
        let mut registry = SegmentRegistry::new();
        let is_invalid = |r: CodecResult<()>| matches!(r, Err(CodecError::InvalidVariantSpec { .. }));

        assert!(is_invalid(registry.register("", SegmentShape::new())));
        assert!(is_invalid(registry.register("a,b", SegmentShape::new())));
        assert!(is_invalid(registry.register("text", SegmentShape::new())));
        assert!(is_invalid(registry.register(
            "dup",
            SegmentShape::new()
                .required("a", FieldType::Int)
                .optional("a", FieldType::String)
        )));
        assert!(!registry.contains("dup"));
    }

    #[test]
    fn test_register_from_json() {
        let mut registry = SegmentRegistry::new();
        let kind = registry
            .register_from_json(&json!({
                "type": ["mface"],
                "fields": {
                    "emoji_id": "string",
                    "summary": {"type": "string", "required": false}
                }
            }))
            .unwrap();
        assert_eq!(kind, "mface");
        assert!(registry.contains("mface"));

        for bad in [
            json!({"type": ["a", "b"], "fields": {}}),
            json!({"type": [], "fields": {}}),
            json!({"fields": {}}),
            json!({"type": "nested", "fields": {"inner": {"a": "int"}}}),
            json!({"type": "listy", "fields": {"items": "array"}}),
            json!({"type": "weird", "fields": {"x": "datetime"}}),
            json!({"type": "notflat", "fields": ["x"]}),
        ] {
            let err = registry.register_from_json(&bad).unwrap_err();
            assert!(
                matches!(err, CodecError::InvalidVariantSpec { .. }),
                "{bad}: {err:?}"
            );
        }
    }
}
