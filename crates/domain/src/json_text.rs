//! Helpers for warehouse fields that may arrive as JSON-encoded strings.

use serde_json::{Map, Value};

/// Decodes a JSON-encoded string field, keeping the raw value when it is not JSON.
///
/// Non-string values are returned unchanged.
#[must_use]
pub fn decode_lenient(value: &Value) -> Value {
    match value {
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

/// Renders a value for a text telemetry column.
///
/// Strings are kept verbatim, null becomes `None`, and everything else is
/// serialized as compact JSON.
#[must_use]
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Returns a property only when it holds a meaningful value.
///
/// Null, `false`, zero, empty strings and empty containers count as absent.
#[must_use]
pub fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !is_blank(value))
}

/// Returns a present property as a string slice.
#[must_use]
pub fn present_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    present(object, key).and_then(Value::as_str)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number == 0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_lenient, present_str, to_text};

    #[test]
    fn decodes_json_strings_and_keeps_plain_text() {
        assert_eq!(
            decode_lenient(&json!(r#"{"uri":"https://x/y"}"#)),
            json!({"uri": "https://x/y"})
        );
        assert_eq!(
            decode_lenient(&json!("dataset.tbl_result_orders")),
            json!("dataset.tbl_result_orders")
        );
        assert_eq!(decode_lenient(&json!(null)), json!(null));
    }

    #[test]
    fn text_rendering_keeps_strings_verbatim() {
        assert_eq!(to_text(&json!("a=1")), Some("a=1".to_owned()));
        assert_eq!(to_text(&json!({"a": 1})), Some(r#"{"a":1}"#.to_owned()));
        assert_eq!(to_text(&json!(null)), None);
    }

    #[test]
    fn empty_values_are_not_present() {
        let object = json!({"method": "", "uri": "https://x"});
        let Some(object) = object.as_object() else {
            panic!("fixture must be an object");
        };

        assert_eq!(present_str(object, "method"), None);
        assert_eq!(present_str(object, "uri"), Some("https://x"));
    }
}
