//! Extractor chains over loosely-shaped JSON responses.
//!
//! Both Notion and note.com return payloads whose shape varies by endpoint
//! version or object type (a title property may be called `title`, `Name`,
//! or anything else; note.com sometimes wraps responses in `data`). Each
//! variant is handled by one small `fn(&Value) -> Option<T>`, and
//! [`first_match`] tries them in order.

use serde_json::Value;

/// One way of pulling a `T` out of a JSON value.
pub type Extractor<T> = fn(&Value) -> Option<T>;

/// Return the result of the first extractor that yields `Some`.
pub fn first_match<T>(value: &Value, extractors: &[Extractor<T>]) -> Option<T> {
    extractors.iter().find_map(|extract| extract(value))
}

/// Non-empty string at a JSON pointer.
pub fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String or number at a JSON pointer, rendered as a string.
pub fn scalar_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
