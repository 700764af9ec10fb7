//! Verify request building and error/signature handling against the JSON
//! test vectors stored in `test-vectors/`.
//!
//! Request vectors run the operation through `execute` with a recording
//! transport, so they cover parameter mapping, cleaning, key normalization,
//! URL/query encoding and headers in one pass. Bodies are compared as parsed
//! JSON, not raw strings, so field order does not matter.

use std::cell::RefCell;

use dealhub_core::keys::{to_camel_case, to_snake_case};
use dealhub_core::signature::verify_signature;
use dealhub_core::{
    execute, ApiError, ClientConfig, Credentials, DealHubClient, Environment, HttpMethod,
    HttpRequest, HttpResponse, InputItem, Transport, TransportError,
};
use serde_json::Value;

/// Answers every request with an empty list page and keeps what it was sent.
#[derive(Default)]
struct Recorder {
    requests: RefCell<Vec<HttpRequest>>,
}

impl Transport for Recorder {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        Ok(HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: br#"{"data":[],"pagination":{"has_more":false}}"#.to_vec(),
        })
    }
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    for case in cases(include_str!("../../test-vectors/requests.json")) {
        let name = case["name"].as_str().unwrap();
        let environment = match case["environment"].as_str() {
            Some("sandbox") => Environment::Sandbox,
            _ => Environment::Production,
        };
        let client = DealHubClient::with_transport(
            Credentials::new("key_123", environment, "acme"),
            &ClientConfig::default(),
            Recorder::default(),
        );

        execute(
            &client,
            case["resource"].as_str().unwrap(),
            case["operation"].as_str().unwrap(),
            &[InputItem::new(case["params"].clone())],
            false,
        )
        .unwrap_or_else(|e| panic!("{name}: {e}"));

        let requests = client.transport().requests.borrow();
        assert_eq!(requests.len(), 1, "{name}: request count");
        let req = &requests[0];
        let expected = &case["expected_request"];

        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let pair = h.as_array().unwrap();
                (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match &expected["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: expected no body"),
            body => {
                let sent: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&sent, body, "{name}: body");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Error envelopes
// ---------------------------------------------------------------------------

#[test]
fn error_test_vectors() {
    for case in cases(include_str!("../../test-vectors/errors.json")) {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let body = match case["body_text"].as_str() {
            Some(text) => text.as_bytes().to_vec(),
            None => serde_json::to_vec(&case["body"]).unwrap(),
        };

        let err = ApiError::from_status(status, &body);
        assert_eq!(err.status(), Some(status), "{name}: status");
        assert_eq!(err.to_string(), case["expected_message"].as_str().unwrap(), "{name}: message");
    }
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

#[test]
fn signature_test_vectors() {
    for case in cases(include_str!("../../test-vectors/signatures.json")) {
        let name = case["name"].as_str().unwrap();
        let valid = verify_signature(
            case["payload"].as_str().unwrap().as_bytes(),
            case["signature"].as_str().unwrap(),
            case["secret"].as_str().unwrap(),
        );
        assert_eq!(valid, case["valid"].as_bool().unwrap(), "{name}");
    }
}

// ---------------------------------------------------------------------------
// Key normalization
// ---------------------------------------------------------------------------

#[test]
fn key_case_test_vectors() {
    for case in cases(include_str!("../../test-vectors/keys.json")) {
        let input = case["input"].as_str().unwrap();
        let expected = case["expected"].as_str().unwrap();
        assert_eq!(to_snake_case(input), expected, "{input}");
        assert_eq!(to_snake_case(expected), expected, "{input}: idempotent");

        let camel = case["camel"].as_str().unwrap();
        assert_eq!(to_camel_case(expected), camel, "{input}: back to camelCase");
        assert_eq!(to_snake_case(camel), expected, "{input}: camelCase round trip");
    }
}
