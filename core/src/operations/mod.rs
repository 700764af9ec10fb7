//! Resource operations exposed to the workflow host.
//!
//! # Design
//! Each resource module contributes a table of `OperationSpec`s. A spec names
//! the operation, declares the parameters it cannot run without, and maps
//! the host's parameters to a [`Plan`]. Execution is shared: the plan is run
//! against the transport core and the result is fanned out into output
//! items paired with the input item that produced them.

mod approval;
mod deal_room;
mod document;
mod fields;
mod opportunity;
mod plan;
mod playbook;
mod product;
mod quote;
mod user;
mod version;
mod webhook;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};
use tracing::warn;

use crate::client::DealHubClient;
use crate::error::{ApiError, OperationError};
use crate::http::Transport;
use crate::params::Params;
use crate::transfer::BinaryData;

pub(crate) use fields::truthy;
pub use plan::{Call, Output, Plan, Produced};

/// API resources with operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Quote,
    DealRoom,
    Product,
    Playbook,
    User,
    Version,
    Opportunity,
    Approval,
    Document,
    Webhook,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::Quote,
        Resource::DealRoom,
        Resource::Product,
        Resource::Playbook,
        Resource::User,
        Resource::Version,
        Resource::Opportunity,
        Resource::Approval,
        Resource::Document,
        Resource::Webhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Quote => "quote",
            Resource::DealRoom => "dealRoom",
            Resource::Product => "product",
            Resource::Playbook => "playbook",
            Resource::User => "user",
            Resource::Version => "version",
            Resource::Opportunity => "opportunity",
            Resource::Approval => "approval",
            Resource::Document => "document",
            Resource::Webhook => "webhook",
        }
    }

    pub fn operations(&self) -> &'static [OperationSpec] {
        match self {
            Resource::Quote => quote::OPERATIONS,
            Resource::DealRoom => deal_room::OPERATIONS,
            Resource::Product => product::OPERATIONS,
            Resource::Playbook => playbook::OPERATIONS,
            Resource::User => user::OPERATIONS,
            Resource::Version => version::OPERATIONS,
            Resource::Opportunity => opportunity::OPERATIONS,
            Resource::Approval => approval::OPERATIONS,
            Resource::Document => document::OPERATIONS,
            Resource::Webhook => webhook::OPERATIONS,
        }
    }

    pub fn operation(&self, name: &str) -> Result<&'static OperationSpec, ApiError> {
        self.operations()
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| ApiError::UnknownOperation {
                resource: self.as_str().to_string(),
                operation: name.to_string(),
            })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ApiError::UnknownResource(s.to_string()))
    }
}

/// One entry of a resource's operation table.
pub struct OperationSpec {
    pub name: &'static str,
    /// Parameters that must be present and non-empty.
    pub required: &'static [&'static str],
    build: fn(&Params) -> Result<Plan, ApiError>,
}

impl OperationSpec {
    pub(crate) const fn new(
        name: &'static str,
        required: &'static [&'static str],
        build: fn(&Params) -> Result<Plan, ApiError>,
    ) -> Self {
        Self {
            name,
            required,
            build,
        }
    }

    /// Checks required parameters, then resolves the plan.
    pub fn plan(&self, params: &Params) -> Result<Plan, ApiError> {
        if let Some(missing) = self.required.iter().find(|name| !params.has(name)) {
            return Err(ApiError::MissingParameter(missing.to_string()));
        }
        (self.build)(params)
    }
}

impl fmt::Debug for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationSpec")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish()
    }
}

/// One input item handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct InputItem {
    pub params: Params,
    pub binary: HashMap<String, BinaryData>,
}

impl InputItem {
    pub fn new(params: impl Into<Params>) -> Self {
        Self {
            params: params.into(),
            binary: HashMap::new(),
        }
    }

    pub fn with_binary(mut self, property: impl Into<String>, data: BinaryData) -> Self {
        self.binary.insert(property.into(), data);
        self
    }
}

/// One output item, paired with the index of the input item it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputItem {
    pub json: Value,
    pub binary: HashMap<String, BinaryData>,
    pub paired_item: usize,
}

impl OutputItem {
    fn json(json: Value, paired_item: usize) -> Self {
        Self {
            json,
            binary: HashMap::new(),
            paired_item,
        }
    }
}

/// Runs one operation for one input item. Array results fan out into one
/// output item per element.
pub fn execute_item<T: Transport>(
    client: &DealHubClient<T>,
    spec: &OperationSpec,
    item: &InputItem,
    index: usize,
) -> Result<Vec<OutputItem>, ApiError> {
    let plan = spec.plan(&item.params)?;
    match plan.run(client, &item.binary)? {
        Produced::Json(Value::Array(records)) => Ok(records
            .into_iter()
            .map(|record| OutputItem::json(record, index))
            .collect()),
        Produced::Json(value) => Ok(vec![OutputItem::json(value, index)]),
        Produced::Binary {
            json,
            property,
            data,
        } => {
            let mut item = OutputItem::json(json, index);
            item.binary.insert(property, data);
            Ok(vec![item])
        }
    }
}

/// Runs `resource`/`operation` over a batch of input items.
///
/// A failing item aborts the batch with an `OperationError`, unless the host
/// asked to `continue_on_fail`, in which case the item yields
/// `{"error": message}` and the next item runs.
pub fn execute<T: Transport>(
    client: &DealHubClient<T>,
    resource: &str,
    operation: &str,
    items: &[InputItem],
    continue_on_fail: bool,
) -> Result<Vec<OutputItem>, OperationError> {
    let spec = resource
        .parse::<Resource>()
        .and_then(|r| r.operation(operation));

    let mut output = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let result = match &spec {
            Ok(spec) => execute_item(client, spec, item, index),
            Err(e) => Err(e.clone()),
        };
        match result {
            Ok(items) => output.extend(items),
            Err(source) if continue_on_fail => {
                warn!(resource, operation, index, error = %source, "operation failed, continuing");
                output.push(OutputItem::json(json!({ "error": source.to_string() }), index));
            }
            Err(source) => {
                return Err(OperationError {
                    resource: resource.to_string(),
                    operation: operation.to_string(),
                    item_index: index,
                    source,
                })
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::credentials::{Credentials, Environment};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportError};
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct Canned {
        bodies: RefCell<Vec<(u16, Vec<u8>)>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Canned {
        fn json(responses: Vec<(u16, Value)>) -> Self {
            Self {
                bodies: RefCell::new(
                    responses
                        .into_iter()
                        .map(|(s, v)| (s, serde_json::to_vec(&v).unwrap()))
                        .collect(),
                ),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            let mut bodies = self.bodies.borrow_mut();
            if bodies.is_empty() {
                return Err(TransportError::new("no canned response"));
            }
            let (status, body) = bodies.remove(0);
            Ok(HttpResponse {
                status,
                headers: vec![("content-type".to_string(), "application/pdf".to_string())],
                body,
            })
        }
    }

    fn client(responses: Vec<(u16, Value)>) -> DealHubClient<Canned> {
        DealHubClient::with_transport(
            Credentials::new("k", Environment::Production, "acme"),
            &ClientConfig::default(),
            Canned::json(responses),
        )
    }

    fn plan(resource: Resource, operation: &str, params: Value) -> Result<Plan, ApiError> {
        resource
            .operation(operation)
            .unwrap()
            .plan(&Params::from_value(params))
    }

    #[test]
    fn every_resource_has_unique_operation_names() {
        let mut total = 0;
        for resource in Resource::ALL {
            let names: HashSet<_> = resource.operations().iter().map(|s| s.name).collect();
            assert_eq!(names.len(), resource.operations().len(), "{resource}");
            assert!(names.contains("get") && names.contains("getAll"), "{resource}");
            total += names.len();
        }
        assert_eq!(total, 79);
    }

    #[test]
    fn resource_names_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
        }
        assert!(matches!(
            "invoice".parse::<Resource>(),
            Err(ApiError::UnknownResource(_))
        ));
    }

    #[test]
    fn unknown_operation_is_reported() {
        let err = Resource::Quote.operation("explode").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown operation 'explode' for resource 'quote'"
        );
    }

    #[test]
    fn required_parameters_are_checked_before_building() {
        let err = plan(Resource::Quote, "get", json!({})).unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter(ref p) if p == "quoteId"));
    }

    #[test]
    fn array_results_fan_out_with_pairing() {
        let c = client(vec![(
            200,
            json!({ "data": [{ "id": "q_1" }, { "id": "q_2" }], "pagination": { "has_more": false } }),
        )]);
        let items = vec![InputItem::new(json!({ "returnAll": false, "limit": 2 }))];
        let output = execute(&c, "quote", "getAll", &items, false).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|o| o.paired_item == 0));
        assert_eq!(output[1].json["id"], "q_2");
    }

    #[test]
    fn failure_aborts_batch_with_context() {
        let c = client(vec![
            (200, json!({ "id": "q_1" })),
            (404, json!({ "error": { "message": "Quote not found" } })),
        ]);
        let items = vec![
            InputItem::new(json!({ "quoteId": "q_1" })),
            InputItem::new(json!({ "quoteId": "q_404" })),
        ];
        let err = execute(&c, "quote", "get", &items, false).unwrap_err();
        assert_eq!(err.item_index, 1);
        assert_eq!(err.resource, "quote");
        assert_eq!(err.operation, "get");
        assert_eq!(err.to_string(), "Quote not found");
    }

    #[test]
    fn continue_on_fail_records_error_items() {
        let c = client(vec![
            (404, json!({ "error": { "message": "Quote not found" } })),
            (200, json!({ "id": "q_2" })),
        ]);
        let items = vec![
            InputItem::new(json!({ "quoteId": "q_404" })),
            InputItem::new(json!({ "quoteId": "q_2" })),
        ];
        let output = execute(&c, "quote", "get", &items, true).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].json, json!({ "error": "Quote not found" }));
        assert_eq!(output[0].paired_item, 0);
        assert_eq!(output[1].json["id"], "q_2");
        assert_eq!(output[1].paired_item, 1);
    }

    #[test]
    fn unknown_resource_fails_each_item() {
        let c = client(Vec::new());
        let items = vec![InputItem::default(), InputItem::default()];
        let output = execute(&c, "invoice", "get", &items, true).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].json, json!({ "error": "unknown resource 'invoice'" }));
        assert!(c.transport().seen.borrow().is_empty());
    }

    #[test]
    fn delete_returns_acknowledgement() {
        let c = client(vec![(204, Value::Null)]);
        let items = vec![InputItem::new(json!({ "quoteId": "q_1" }))];
        let output = execute(&c, "quote", "delete", &items, false).unwrap();
        assert_eq!(output[0].json, json!({ "success": true, "quoteId": "q_1" }));
        assert_eq!(c.transport().seen.borrow()[0].method, HttpMethod::Delete);
    }

    #[test]
    fn document_download_attaches_binary() {
        let c = DealHubClient::with_transport(
            Credentials::new("k", Environment::Production, "acme"),
            &ClientConfig::default(),
            Canned {
                bodies: RefCell::new(vec![
                    (200, serde_json::to_vec(&json!({ "id": "d_1", "file_name": "Quote.pdf" })).unwrap()),
                    (200, b"%PDF-1.7".to_vec()),
                ]),
                seen: RefCell::new(Vec::new()),
            },
        );
        let items = vec![InputItem::new(json!({ "documentId": "d_1", "binaryPropertyName": "data" }))];
        let output = execute(&c, "document", "download", &items, false).unwrap();
        let file = &output[0].binary["data"];
        assert_eq!(file.data, b"%PDF-1.7");
        assert_eq!(file.file_name.as_deref(), Some("Quote.pdf"));
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(output[0].json["id"], "d_1");

        let seen = c.transport().seen.borrow();
        assert!(seen[0].url.ends_with("/v1/documents/d_1"));
        assert!(seen[1].url.ends_with("/v1/documents/d_1/download"));
    }

    #[test]
    fn add_file_requires_binary_data() {
        let c = client(Vec::new());
        let items = vec![InputItem::new(json!({ "dealRoomId": "r_1", "binaryPropertyName": "data" }))];
        let err = execute(&c, "dealRoom", "addFile", &items, false).unwrap_err();
        assert!(matches!(err.source, ApiError::MissingBinaryData(ref p) if p == "data"));
    }

    #[test]
    fn add_file_uploads_with_resolved_name() {
        let c = client(vec![(201, json!({ "id": "f_1", "file_name": "deck.pdf" }))]);
        let items = vec![InputItem::new(json!({ "dealRoomId": "r_1", "binaryPropertyName": "data" }))
            .with_binary(
                "data",
                BinaryData::new(b"bytes".to_vec(), Some("deck.pdf".to_string()), "application/pdf"),
            )];
        let output = execute(&c, "dealRoom", "addFile", &items, false).unwrap();
        assert_eq!(output[0].json["id"], "f_1");
        let seen = c.transport().seen.borrow();
        let body = String::from_utf8_lossy(seen[0].body.as_deref().unwrap()).into_owned();
        assert!(body.contains("filename=\"deck.pdf\""));
        assert!(seen[0].url.ends_with("/v1/dealrooms/r_1/files"));
    }
}
