//! Typed access to the parameters the host collected for one input item.

use serde_json::{Map, Value};

use crate::client::path_segment;
use crate::error::ApiError;

/// Parameter values for one operation call, keyed by parameter name
/// (`quoteId`, `returnAll`, `additionalFields`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Wraps a JSON object; any other value yields empty parameters.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// True when the parameter is present with a non-empty value.
    pub fn has(&self, name: &str) -> bool {
        match self.get(name) {
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
            None => false,
        }
    }

    /// A required, non-empty string. Numbers are accepted and stringified so
    /// numeric ids work.
    pub fn str(&self, name: &str) -> Result<String, ApiError> {
        match self.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::String(_)) | None => Err(ApiError::MissingParameter(name.to_string())),
            Some(_) => Err(ApiError::invalid(name, "expected a string")),
        }
    }

    /// A required id, percent-encoded for use as one URL path segment.
    pub fn segment(&self, name: &str) -> Result<String, ApiError> {
        let raw = self.str(name)?;
        path_segment(&raw).map_err(|_| ApiError::invalid(name, "is not a usable path segment"))
    }

    /// An optional string; missing and empty both read as `None`.
    pub fn opt_str(&self, name: &str) -> Result<Option<String>, ApiError> {
        match self.str(name) {
            Ok(s) => Ok(Some(s)),
            Err(ApiError::MissingParameter(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, ApiError> {
        match self.get(name) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ApiError::invalid(name, "expected a boolean")),
        }
    }

    pub fn u64(&self, name: &str) -> Result<u64, ApiError> {
        match self.get(name) {
            None => Err(ApiError::MissingParameter(name.to_string())),
            Some(value) => value
                .as_u64()
                .or_else(|| value.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
                .ok_or_else(|| ApiError::invalid(name, "expected a non-negative integer")),
        }
    }

    pub fn u64_or(&self, name: &str, default: u64) -> Result<u64, ApiError> {
        if self.get(name).is_none() {
            return Ok(default);
        }
        self.u64(name)
    }

    /// A required number, returned as JSON so integers stay integers.
    pub fn number(&self, name: &str) -> Result<Value, ApiError> {
        match self.get(name) {
            Some(value @ Value::Number(_)) => Ok(value.clone()),
            Some(_) => Err(ApiError::invalid(name, "expected a number")),
            None => Err(ApiError::MissingParameter(name.to_string())),
        }
    }

    /// A collection parameter (`filters`, `additionalFields`, ...). Missing
    /// means empty.
    pub fn collection(&self, name: &str) -> Result<Map<String, Value>, ApiError> {
        match self.get(name) {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(ApiError::invalid(name, "expected an object")),
        }
    }

    /// A list of strings (multi-select values such as webhook events).
    pub fn str_list(&self, name: &str) -> Result<Vec<String>, ApiError> {
        match self.get(name) {
            None => Err(ApiError::MissingParameter(name.to_string())),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ApiError::invalid(name, "expected a list of strings"))
                })
                .collect(),
            Some(_) => Err(ApiError::invalid(name, "expected a list of strings")),
        }
    }

    /// A JSON parameter given either as an object or as a JSON string.
    pub fn json(&self, name: &str) -> Result<Value, ApiError> {
        match self.get(name) {
            None => Err(ApiError::MissingParameter(name.to_string())),
            Some(value) => parse_json_value(name, value),
        }
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

/// Accepts structured JSON as-is and parses strings.
pub(crate) fn parse_json_value(name: &str, value: &Value) -> Result<Value, ApiError> {
    match value {
        Value::String(text) => {
            serde_json::from_str(text).map_err(|e| ApiError::invalid(name, format!("invalid JSON: {e}")))
        }
        other => Ok(other.clone()),
    }
}
