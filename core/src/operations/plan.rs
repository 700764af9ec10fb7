//! The transport-level work an operation resolves to, and its execution.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::client::DealHubClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, Transport};
use crate::transfer::BinaryData;

use super::fields::truthy;

const DEFAULT_DOWNLOAD_MIME: &str = "application/pdf";

/// How a single call's response becomes operation output.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// The parsed response as-is.
    Response,
    /// `response.data` when present and truthy, else the whole response.
    DataOrResponse,
    /// A fixed acknowledgement, ignoring the response body.
    Fixed(Value),
}

/// One JSON request against the transport core.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Map<String, Value>>,
    pub query: Option<Map<String, Value>>,
    pub output: Output,
}

impl Call {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: None,
            output: Output::Response,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, query: Map<String, Value>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn data_or_response(mut self) -> Self {
        self.output = Output::DataOrResponse;
        self
    }

    pub fn respond_with(mut self, value: Value) -> Self {
        self.output = Output::Fixed(value);
        self
    }
}

/// What an operation does once its parameters are resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Call(Call),
    /// Every record of a list endpoint.
    FetchAll {
        path: String,
        query: Map<String, Value>,
    },
    /// One page of at most `limit` records.
    Page {
        path: String,
        query: Map<String, Value>,
        limit: u64,
    },
    /// Fetch metadata, then the file itself, and attach it to the output.
    Download {
        metadata_path: String,
        download_path: String,
        binary_property: String,
        default_file_name: String,
    },
    /// Upload the input item's binary attachment.
    Upload {
        path: String,
        binary_property: String,
        file_name: Option<String>,
    },
}

impl From<Call> for Plan {
    fn from(call: Call) -> Self {
        Plan::Call(call)
    }
}

/// Result of running a plan for one input item.
#[derive(Debug, Clone, PartialEq)]
pub enum Produced {
    Json(Value),
    Binary {
        json: Value,
        property: String,
        data: BinaryData,
    },
}

impl Plan {
    pub fn run<T: Transport>(
        &self,
        client: &DealHubClient<T>,
        binary: &HashMap<String, BinaryData>,
    ) -> Result<Produced, ApiError> {
        match self {
            Plan::Call(call) => {
                let response = client.send(
                    call.method,
                    &call.path,
                    call.body.as_ref(),
                    call.query.as_ref(),
                )?;
                Ok(Produced::Json(shape(response, &call.output)))
            }
            Plan::FetchAll { path, query } => {
                let records = client.fetch_all(HttpMethod::Get, path, None, Some(query))?;
                Ok(Produced::Json(Value::Array(records)))
            }
            Plan::Page { path, query, limit } => {
                let records = client.fetch_page(path, Some(query), *limit)?;
                Ok(Produced::Json(Value::Array(records)))
            }
            Plan::Download {
                metadata_path,
                download_path,
                binary_property,
                default_file_name,
            } => {
                let meta = client.send(HttpMethod::Get, metadata_path, None, None)?;
                let download = client.download(download_path)?;
                let file_name = non_empty_str(&meta, "file_name")
                    .unwrap_or(default_file_name)
                    .to_string();
                let mime_type = non_empty_str(&meta, "mime_type")
                    .or(download.content_type.as_deref())
                    .unwrap_or(DEFAULT_DOWNLOAD_MIME)
                    .to_string();
                Ok(Produced::Binary {
                    json: meta,
                    property: binary_property.clone(),
                    data: BinaryData::new(download.bytes, Some(file_name), mime_type),
                })
            }
            Plan::Upload {
                path,
                binary_property,
                file_name,
            } => {
                let file = binary
                    .get(binary_property)
                    .ok_or_else(|| ApiError::MissingBinaryData(binary_property.clone()))?;
                let name = file_name
                    .as_deref()
                    .or(file.file_name.as_deref())
                    .filter(|n| !n.is_empty())
                    .unwrap_or("file");
                Ok(Produced::Json(client.upload(path, name, file)?))
            }
        }
    }
}

fn shape(response: Value, output: &Output) -> Value {
    match output {
        Output::Response => response,
        Output::Fixed(value) => value.clone(),
        Output::DataOrResponse => match response.get("data") {
            Some(data) if truthy(data) => data.clone(),
            _ => response,
        },
    }
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_or_response_prefers_data() {
        let response = json!({ "data": [1, 2], "pagination": {} });
        assert_eq!(shape(response, &Output::DataOrResponse), json!([1, 2]));

        let response = json!({ "id": "t_1" });
        assert_eq!(
            shape(response.clone(), &Output::DataOrResponse),
            response
        );

        let response = json!({ "data": null, "id": 1 });
        assert_eq!(
            shape(response.clone(), &Output::DataOrResponse),
            response
        );
    }

    #[test]
    fn fixed_output_ignores_response() {
        let ack = json!({ "success": true, "quoteId": "q_1" });
        assert_eq!(shape(Value::Null, &Output::Fixed(ack.clone())), ack);
    }

    #[test]
    fn call_builder() {
        let mut body = Map::new();
        body.insert("reason".to_string(), json!("price"));
        let call = Call::post("/quotes/q_1/reject").body(body.clone());
        assert_eq!(call.method, HttpMethod::Post);
        assert_eq!(call.body, Some(body));
        assert_eq!(call.output, Output::Response);
    }
}
