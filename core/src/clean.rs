//! Strips meaningless values from outbound query and body maps.

use serde_json::{Map, Value};

/// Drops top-level entries whose value is `null` or `""`.
///
/// Only the top level is inspected: nested objects and arrays are
/// caller-supplied payloads (`metadata`, `line_items`) and are kept as-is.
/// `0`, `false` and arrays of any length are meaningful and kept.
pub fn clean(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(_, value)| !is_blank(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// In-place variant of [`clean`].
pub fn clean_in_place(map: &mut Map<String, Value>) {
    map.retain(|_, value| !is_blank(value));
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn drops_null_and_empty_strings() {
        let cleaned = clean(&object(json!({
            "name": "Q-1",
            "currency": "",
            "playbook_id": null
        })));
        assert_eq!(Value::Object(cleaned), json!({ "name": "Q-1" }));
    }

    #[test]
    fn keeps_zero_false_and_arrays() {
        let input = object(json!({
            "amount": 0,
            "is_active": false,
            "events": [],
            "recipient_emails": ["a@example.com"],
            "note": " "
        }));
        let cleaned = clean(&input);
        assert_eq!(cleaned, input);
    }

    #[test]
    fn nested_values_are_not_touched() {
        let cleaned = clean(&object(json!({
            "metadata": { "region": "", "owner": null },
            "line_items": [ { "sku": "" } ]
        })));
        assert_eq!(
            Value::Object(cleaned),
            json!({
                "metadata": { "region": "", "owner": null },
                "line_items": [ { "sku": "" } ]
            })
        );
    }

    #[test]
    fn in_place_matches_copying_clean() {
        let mut map = object(json!({ "a": "", "b": 1, "c": null }));
        let copy = clean(&map);
        clean_in_place(&mut map);
        assert_eq!(map, copy);
    }
}
