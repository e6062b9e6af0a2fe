/// The value model shared by the transforms and the façade.
///
/// Application payloads are trees of [`Value`]. Unlike `serde_json::Value`,
/// a `Value` can hold a native [`Timestamp`]. The serializer turns those
/// timestamps into date markers so the tree can go over the wire; the parser
/// turns markers back into timestamps.
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

/// Keyed container of a plain object node.
pub type Map = BTreeMap<String, Value>;

/// A point in time with millisecond precision.
///
/// A timestamp may be *invalid*, which is what decoding a malformed date
/// marker yields. Invalid timestamps compare equal to each other and carry no
/// epoch value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    /// Wrap a `DateTime`, dropping anything below millisecond precision.
    pub fn new(datetime: DateTime<Utc>) -> Self {
        Self(Some(datetime.trunc_subsecs(3)))
    }

    /// The current time.
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// An invalid timestamp.
    pub fn invalid() -> Self {
        Self(None)
    }

    /// Build a timestamp from epoch milliseconds.
    ///
    /// Out-of-range values produce an invalid timestamp.
    pub fn from_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis))
    }

    /// Build a timestamp from a possibly fractional millisecond count.
    ///
    /// The fraction is truncated toward zero. Non-finite or out-of-range
    /// values produce an invalid timestamp.
    pub fn from_millis_f64(millis: f64) -> Self {
        if !millis.is_finite() {
            return Self::invalid();
        }
        let truncated = millis.trunc();
        if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
            return Self::invalid();
        }
        Self::from_millis(truncated as i64)
    }

    /// Milliseconds since the Unix epoch, `None` when invalid.
    pub fn millis(&self) -> Option<i64> {
        self.0.map(|dt| dt.timestamp_millis())
    }

    /// Returns `true` unless this is an invalid timestamp.
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// The underlying `DateTime`, `None` when invalid.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// RFC 3339 rendering with milliseconds, e.g. `2023-11-14T22:13:20.000Z`.
    pub fn to_rfc3339(&self) -> Option<String> {
        self.0
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(s) => f.write_str(&s),
            None => f.write_str("Invalid Date"),
        }
    }
}

/// Tag of a [`Value`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Timestamp,
    Array,
    Object,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Timestamp => "timestamp",
            Kind::Array => "array",
            Kind::Object => "object",
        };
        f.write_str(name)
    }
}

/// A node of an application payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Timestamp(Timestamp),
    Array(Vec<Value>),
    Object(Map),
}

static NULL: Value = Value::Null;

impl Value {
    /// Build an object node from key/value pairs.
    ///
    /// ```ignore
    /// let user = Value::object([("name", Value::from("Alice")), ("age", Value::from(30))]);
    /// ```
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        entries.into_iter().collect()
    }

    /// The variant tag of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Timestamp(_) => Kind::Timestamp,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Look up a property of an object node.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Convert into the JSON form written to the store.
    ///
    /// Timestamps are rendered as RFC 3339 strings and invalid timestamps as
    /// `null`. Run [`crate::serializer::serialize`] first to get date markers
    /// instead; only timestamps the serializer does not reach (inside arrays)
    /// end up as strings.
    pub fn to_wire(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Timestamp(ts) => ts
                .to_rfc3339()
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_wire).collect()),
            Value::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_wire()))
                    .collect(),
            ),
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Returns `Value::Null` for missing keys and non-object values.
    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Value::Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Timestamp(Timestamp::new(dt))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<JsonValue> for Value {
    /// Lift a JSON value read from the store. Never yields a timestamp.
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        value.to_wire()
    }
}

impl From<&Value> for JsonValue {
    fn from(value: &Value) -> Self {
        value.to_wire()
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => match ts.to_rfc3339() {
                Some(s) => serializer.serialize_str(&s),
                None => serializer.serialize_unit(),
            },
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        JsonValue::deserialize(deserializer).map(Value::from)
    }
}

// =============================================================================
// Node types
// =============================================================================

/// A Rust type that one [`Value`] variant holds.
///
/// Used by [`crate::convert::convert_by_type`] to pick out the nodes of a
/// given type without inspecting the variant by hand at every call site.
pub trait NodeType {
    /// The tag of the variant holding this type.
    const KIND: Kind;

    /// Borrow the payload if `node` holds this type.
    fn from_node(node: &Value) -> Option<&Self>;
}

impl NodeType for Timestamp {
    const KIND: Kind = Kind::Timestamp;

    fn from_node(node: &Value) -> Option<&Self> {
        node.as_timestamp()
    }
}

impl NodeType for bool {
    const KIND: Kind = Kind::Bool;

    fn from_node(node: &Value) -> Option<&Self> {
        match node {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl NodeType for Number {
    const KIND: Kind = Kind::Number;

    fn from_node(node: &Value) -> Option<&Self> {
        match node {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl NodeType for String {
    const KIND: Kind = Kind::String;

    fn from_node(node: &Value) -> Option<&Self> {
        match node {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl NodeType for Vec<Value> {
    const KIND: Kind = Kind::Array;

    fn from_node(node: &Value) -> Option<&Self> {
        node.as_array()
    }
}

impl NodeType for Map {
    const KIND: Kind = Kind::Object;

    fn from_node(node: &Value) -> Option<&Self> {
        node.as_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_truncates_to_millis() {
        let dt = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let ts = Timestamp::new(dt);
        assert_eq!(ts.millis(), Some(1_700_000_000_123));
        assert_eq!(Timestamp::from_millis(1_700_000_000_123), ts);
    }

    #[test]
    fn test_timestamp_from_fractional_millis() {
        assert_eq!(Timestamp::from_millis_f64(1.9).millis(), Some(1));
        assert_eq!(Timestamp::from_millis_f64(-1.9).millis(), Some(-1));
        assert!(!Timestamp::from_millis_f64(f64::NAN).is_valid());
        assert!(!Timestamp::from_millis_f64(f64::INFINITY).is_valid());
        assert!(!Timestamp::from_millis_f64(1e300).is_valid());
    }

    #[test]
    fn test_timestamp_rendering() {
        let ts = Timestamp::from_millis(1_700_000_000_000);
        assert_eq!(ts.to_string(), "2023-11-14T22:13:20.000Z");
        assert_eq!(Timestamp::invalid().to_string(), "Invalid Date");
        assert_eq!(Timestamp::invalid().millis(), None);
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(Value::Null.kind(), Kind::Null);
        assert_eq!(Value::from(1).kind(), Kind::Number);
        assert_eq!(Value::from("a").kind(), Kind::String);
        assert_eq!(Value::from(Timestamp::now()).kind(), Kind::Timestamp);
        assert_eq!(Value::from(vec![Value::from(1)]).kind(), Kind::Array);
        assert_eq!(Value::object([("a", 1)]).kind(), Kind::Object);
        assert_eq!(<Timestamp as NodeType>::KIND, Kind::Timestamp);
    }

    #[test]
    fn test_index_missing_key_is_null() {
        let value = Value::object([("a", 1)]);
        assert_eq!(value["a"], Value::from(1));
        assert!(value["missing"].is_null());
        assert!(Value::from(3)["a"].is_null());
    }

    #[test]
    fn test_wire_conversion() {
        let value = Value::object([
            ("name", Value::from("Alice")),
            ("score", Value::from(2.5)),
            (
                "seen",
                Value::from(vec![Value::from(Timestamp::from_millis(0))]),
            ),
            ("broken", Value::from(Timestamp::invalid())),
        ]);

        assert_eq!(
            value.to_wire(),
            json!({
                "name": "Alice",
                "score": 2.5,
                "seen": ["1970-01-01T00:00:00.000Z"],
                "broken": null,
            })
        );
    }

    #[test]
    fn test_from_json_preserves_structure() {
        let json = json!({"a": [1, {"b": true}], "c": null, "d": "x"});
        let value = Value::from(json.clone());
        assert_eq!(value["a"].as_array().map(Vec::len), Some(2));
        assert!(value["c"].is_null());
        assert_eq!(value.to_wire(), json);
    }

    #[test]
    fn test_serde_matches_wire_form() {
        let value = Value::object([
            ("n", Value::from(1)),
            ("t", Value::from(Timestamp::from_millis(0))),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, value.to_wire());

        let back: Value = serde_json::from_value(json!({"n": 1})).unwrap();
        assert_eq!(back, Value::object([("n", 1)]));
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert!(Value::from(f64::NAN).is_null());
    }
}
