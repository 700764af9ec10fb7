//! camelCase ↔ snake_case key conversion for request shaping.

use serde_json::{Map, Value};

/// `quoteId` → `quote_id`. Keys already in snake_case come back unchanged.
///
/// A leading capital is lowercased without a leading underscore
/// (`QuoteId` → `quote_id`).
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `quote_id` → `quoteId`. Only an underscore followed by a lowercase ASCII
/// letter is collapsed.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('_', Some(next)) if next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Rewrites every key of `map` to snake_case, recursing into nested objects
/// and into objects held in arrays. Scalars and arrays of scalars pass
/// through untouched.
pub fn keys_to_snake_case(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (to_snake_case(key), value_to_snake_case(value)))
        .collect()
}

fn value_to_snake_case(value: &Value) -> Value {
    match value {
        Value::Object(inner) => Value::Object(keys_to_snake_case(inner)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(inner) => Value::Object(keys_to_snake_case(inner)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
