//! Lenient accessors for loosely structured task payloads
//!
//! Missing and `null` fields read as absent. A field that is present with the
//! wrong shape is an input error, never a panic.

use crate::error::{DispatchError, DispatchResult};
use serde_json::{Map, Value};

pub type Payload = Map<String, Value>;

/// Field value, treating `null` as absent
pub(crate) fn field<'a>(data: &'a Payload, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|value| !value.is_null())
}

/// List field; absent reads as an empty list
pub(crate) fn list_field<'a>(
    data: &'a Payload,
    key: &str,
    shape_error: &str,
) -> DispatchResult<&'a [Value]> {
    match field(data, key) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(DispatchError::invalid_input(shape_error)),
    }
}

/// Object field; absent reads as `None`
pub(crate) fn object_field<'a>(
    data: &'a Payload,
    key: &str,
) -> DispatchResult<Option<&'a Payload>> {
    match field(data, key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(DispatchError::invalid_input(format!(
            "{key} must be an object"
        ))),
    }
}

/// String field; absent reads as `None`, and so does an empty string
pub(crate) fn non_empty_str<'a>(data: Option<&'a Payload>, key: &str) -> Option<&'a str> {
    data.and_then(|map| field(map, key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Numeric field of an optional object; absent reads as 0
pub(crate) fn number_or_zero(data: Option<&Payload>, key: &str) -> DispatchResult<f64> {
    match data.and_then(|map| field(map, key)) {
        None => Ok(0.0),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| DispatchError::invalid_input(format!("{key} must be numeric"))),
    }
}

/// Every element as a string slice
pub(crate) fn string_items<'a>(items: &'a [Value], shape_error: &str) -> DispatchResult<Vec<&'a str>> {
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| DispatchError::invalid_input(shape_error))
        })
        .collect()
}
