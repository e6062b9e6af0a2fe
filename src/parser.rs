/// Wire form → application payload.
///
/// Date markers are turned back into timestamps wherever they appear as
/// properties of (nested) objects.
use crate::convert::convert_by_predicate;
use crate::serializer::{DATE_TYPE, MARKER_TYPE_KEY, MARKER_VALUE_KEY};
use crate::value::{Timestamp, Value};

/// Parse a value read from the store.
///
/// `Null` is returned unchanged. Every object property that is a date marker
/// becomes a [`Timestamp`]. Markers inside arrays are not reached.
///
/// Malformed markers are not rejected: a marker without a numeric `value`
/// decodes to an invalid timestamp.
pub fn parse(input: &Value) -> Value {
    if input.is_null() {
        return Value::Null;
    }
    convert_by_predicate(input, is_date_marker, |node| {
        Value::Timestamp(marker_timestamp(node))
    })
}

/// Returns `true` for objects tagged `"type": "date"`.
pub fn is_date_marker(node: &Value) -> bool {
    node.get(MARKER_TYPE_KEY).and_then(Value::as_str) == Some(DATE_TYPE)
}

/// Decode the timestamp carried by a date marker.
pub fn marker_timestamp(marker: &Value) -> Timestamp {
    match marker.get(MARKER_VALUE_KEY) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(millis) => Timestamp::from_millis(millis),
            None => n
                .as_f64()
                .map(Timestamp::from_millis_f64)
                .unwrap_or_else(Timestamp::invalid),
        },
        _ => Timestamp::invalid(),
    }
}
