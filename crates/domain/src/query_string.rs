//! Conversion between the warehouse key/value query representation and wire format.

use serde_json::Value;
use url::form_urlencoded;

/// Encodes a query-string field as an `application/x-www-form-urlencoded` string.
///
/// Objects are encoded pair by pair, arrays repeat their key, strings are
/// assumed to already be in wire format, and null encodes as an empty string.
#[must_use]
pub fn encode_query_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(raw) => raw.clone(),
        Value::Object(pairs) => {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in pairs {
                match value {
                    Value::Array(items) => {
                        for item in items {
                            serializer.append_pair(key, scalar_text(item).as_str());
                        }
                    }
                    other => {
                        serializer.append_pair(key, scalar_text(other).as_str());
                    }
                }
            }
            serializer.finish()
        }
        other => scalar_text(other),
    }
}

/// Decodes a wire-format query string into key/value pairs.
#[cfg(test)]
fn decode_query_string(encoded: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(encoded.trim_start_matches('?').as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use serde_json::{Map, Value, json};

    use super::{decode_query_string, encode_query_string};

    #[test]
    fn mapping_roundtrips_through_wire_format() {
        let encoded = encode_query_string(&json!({"a": "1", "b": "2"}));
        let decoded: BTreeMap<String, String> = decode_query_string(&encoded).into_iter().collect();

        assert_eq!(
            decoded,
            BTreeMap::from([
                ("a".to_owned(), "1".to_owned()),
                ("b".to_owned(), "2".to_owned()),
            ])
        );
    }

    #[test]
    fn scalars_and_arrays_are_rendered() {
        let encoded = encode_query_string(&json!({"page": 2, "tag": ["x", "y"], "q": "a b"}));
        let mut pairs: Vec<&str> = encoded.split('&').collect();
        pairs.sort_unstable();

        assert_eq!(pairs, vec!["page=2", "q=a+b", "tag=x", "tag=y"]);
    }

    #[test]
    fn strings_and_null_are_passed_through() {
        assert_eq!(encode_query_string(&json!("a=1&b=2")), "a=1&b=2");
        assert_eq!(encode_query_string(&Value::Null), "");
    }

    proptest! {
        #[test]
        fn arbitrary_string_mappings_roundtrip(
            pairs in proptest::collection::btree_map("[a-z_]{1,8}", "[ -~]{0,12}", 0..6)
        ) {
            let object: Map<String, Value> = pairs
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect();
            let encoded = encode_query_string(&Value::Object(object));
            let decoded: BTreeMap<String, String> =
                decode_query_string(&encoded).into_iter().collect();

            prop_assert_eq!(decoded, pairs);
        }
    }
}
