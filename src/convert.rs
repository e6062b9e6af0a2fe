/// Deep object transforms.
///
/// Both functions walk the plain-object nodes of a [`Value`] tree and swap
/// selected nodes for the output of a callback. The input is never mutated;
/// every object on the walked path is copied.
///
/// Arrays are leaves: neither function looks inside them, so an object stored
/// in an array is returned exactly as it was given.
use crate::value::{NodeType, Value};

/// Replace every property holding a `T` with `callback(&t)`.
///
/// - `Null` input is returned as `Null`; any other non-object input is
///   returned unchanged.
/// - For each property of an object: a `T` is replaced, another object is
///   walked recursively, anything else is kept as is.
///
/// Only properties are tested, never the input node itself.
///
/// # Example
///
/// ```ignore
/// let out = convert_by_type::<Timestamp, _>(&input, |ts| Value::from(ts.millis()));
/// ```
pub fn convert_by_type<T, F>(input: &Value, callback: F) -> Value
where
    T: NodeType + ?Sized,
    F: Fn(&T) -> Value,
{
    convert_by_type_with(input, &callback)
}

fn convert_by_type_with<T, F>(input: &Value, callback: &F) -> Value
where
    T: NodeType + ?Sized,
    F: Fn(&T) -> Value,
{
    let Value::Object(map) = input else {
        return input.clone();
    };

    let mut copy = map.clone();
    for value in copy.values_mut() {
        if let Some(target) = T::from_node(value) {
            *value = callback(target);
        } else if value.is_object() {
            *value = convert_by_type_with(value, callback);
        }
    }
    Value::Object(copy)
}

/// Replace every nested object satisfying `predicate` with `callback(node)`.
///
/// - `Null` input is returned as `Null`; any other non-object input is
///   returned unchanged.
/// - For each object-valued property: if the predicate holds the node is
///   replaced and not descended into, otherwise it is walked recursively.
///   Other properties are kept as is.
///
/// The predicate sees the node as it was in the input.
pub fn convert_by_predicate<P, F>(input: &Value, predicate: P, callback: F) -> Value
where
    P: Fn(&Value) -> bool,
    F: Fn(&Value) -> Value,
{
    convert_by_predicate_with(input, &predicate, &callback)
}

fn convert_by_predicate_with<P, F>(input: &Value, predicate: &P, callback: &F) -> Value
where
    P: Fn(&Value) -> bool,
    F: Fn(&Value) -> Value,
{
    let Value::Object(map) = input else {
        return input.clone();
    };

    let mut copy = map.clone();
    for value in copy.values_mut() {
        if !value.is_object() {
            continue;
        }
        *value = if predicate(value) {
            callback(value)
        } else {
            convert_by_predicate_with(value, predicate, callback)
        };
    }
    Value::Object(copy)
}
