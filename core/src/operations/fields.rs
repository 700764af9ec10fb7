//! Helpers shared by the per-resource operation builders.

use serde_json::{Map, Value};

use crate::clean::{clean, clean_in_place};
use crate::error::ApiError;
use crate::keys::{keys_to_snake_case, to_snake_case};
use crate::params::{parse_json_value, Params};

use super::plan::Plan;

/// JavaScript-style truthiness, which decides whether optional fields are
/// forwarded.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Builds an outbound JSON body from camelCase option collections.
#[derive(Debug, Default)]
pub(super) struct Body(Map<String, Value>);

impl Body {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Copies each named field that is truthy, under its snake_case name.
    pub(super) fn truthy(mut self, fields: &Map<String, Value>, names: &[&str]) -> Self {
        for name in names {
            if let Some(value) = fields.get(*name).filter(|v| truthy(v)) {
                self.0.insert(to_snake_case(name), value.clone());
            }
        }
        self
    }

    /// Copies each named field that was given at all (including `0` and
    /// `false`), under its snake_case name.
    pub(super) fn present(mut self, fields: &Map<String, Value>, names: &[&str]) -> Self {
        for name in names {
            if let Some(value) = fields.get(*name).filter(|v| !v.is_null()) {
                self.0.insert(to_snake_case(name), value.clone());
            }
        }
        self
    }

    /// Copies a truthy field under an explicit wire name.
    pub(super) fn renamed(mut self, fields: &Map<String, Value>, name: &str, wire: &str) -> Self {
        if let Some(value) = fields.get(name).filter(|v| truthy(v)) {
            self.0.insert(wire.to_string(), value.clone());
        }
        self
    }

    /// Copies a truthy JSON field, parsing it first when given as text.
    pub(super) fn json(mut self, fields: &Map<String, Value>, name: &str) -> Result<Self, ApiError> {
        if let Some(value) = fields.get(name).filter(|v| truthy(v)) {
            self.0
                .insert(to_snake_case(name), parse_json_value(name, value)?);
        }
        Ok(self)
    }

    /// The body with blank top-level values removed.
    pub(super) fn cleaned(mut self) -> Map<String, Value> {
        clean_in_place(&mut self.0);
        self.0
    }

    /// The body exactly as built.
    pub(super) fn raw(self) -> Map<String, Value> {
        self.0
    }
}

/// Splits `"a@x.com, b@y.com"` into trimmed, non-empty entries.
pub(super) fn comma_list(text: &str) -> Vec<Value> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Value::from)
        .collect()
}

/// The snake_cased, cleaned query built from a filter collection.
pub(super) fn filter_query(params: &Params, collection: &str) -> Result<Map<String, Value>, ApiError> {
    Ok(clean(&keys_to_snake_case(&params.collection(collection)?)))
}

/// A list endpoint: every page when `returnAll` is set, otherwise one page
/// of `limit` records.
pub(super) fn list(params: &Params, path: &str, filters: &str) -> Result<Plan, ApiError> {
    let query = filter_query(params, filters)?;
    if params.bool_or("returnAll", false)? {
        Ok(Plan::FetchAll {
            path: path.to_string(),
            query,
        })
    } else {
        Ok(Plan::Page {
            path: path.to_string(),
            query,
            limit: params.u64("limit")?,
        })
    }
}
