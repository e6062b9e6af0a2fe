/// Application payload → wire form.
///
/// Timestamps become date markers, `{ "value": <epoch ms>, "type": "date" }`,
/// and top-level `Null` properties are dropped.
use crate::convert::convert_by_type;
use crate::value::{Map, Timestamp, Value};

/// Key holding the epoch milliseconds of a date marker.
pub const MARKER_VALUE_KEY: &str = "value";
/// Key holding the type tag of a date marker.
pub const MARKER_TYPE_KEY: &str = "type";
/// Type tag identifying a date marker.
pub const DATE_TYPE: &str = "date";

/// Serialize an application payload for the store.
///
/// `Null` is returned unchanged. For objects, top-level `Null` properties are
/// removed and every timestamp reachable through nested objects is replaced
/// by a date marker. Timestamps inside arrays are not reached.
///
/// # Example
///
/// ```ignore
/// let wire = serialize(&Value::object([("date", Timestamp::from_millis(1_700_000_000_000))]));
/// // { "date": { "value": 1700000000000, "type": "date" } }
/// ```
pub fn serialize(input: &Value) -> Value {
    if input.is_null() {
        return Value::Null;
    }
    let filtered = remove_empty_props(input);
    convert_by_type::<Timestamp, _>(&filtered, date_marker)
}

/// Copy of `input` without its top-level `Null` properties.
///
/// Nested objects are kept as they are. Non-object input is returned
/// unchanged.
pub fn remove_empty_props(input: &Value) -> Value {
    match input {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The date marker standing in for `timestamp` on the wire.
///
/// An invalid timestamp yields a marker whose value is `Null`.
pub fn date_marker(timestamp: &Timestamp) -> Value {
    let mut marker = Map::new();
    marker.insert(MARKER_VALUE_KEY.to_string(), Value::from(timestamp.millis()));
    marker.insert(MARKER_TYPE_KEY.to_string(), Value::from(DATE_TYPE));
    Value::Object(marker)
}
