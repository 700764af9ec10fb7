use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// The bytes served by every document download.
pub const DOCUMENT_BYTES: &[u8] = b"%PDF-1.4 mock document";

/// Size of the fixed product catalog served by `GET /v1/products`.
pub const CATALOG_SIZE: usize = 120;

/// Requests to this product fail once with 503, then succeed.
pub const FLAKY_PRODUCT: &str = "p_flaky";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub deal_room_id: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
pub struct Db {
    pub quotes: Vec<Value>,
    pub webhooks: Vec<Value>,
    pub files: Vec<UploadedFile>,
    pub flaky_hits: u32,
}

/// Shared state. The request log is a plain mutex so tests can read it from
/// outside the runtime.
#[derive(Clone, Default)]
pub struct MockState {
    pub db: Arc<RwLock<Db>>,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockState {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear_requests(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, request: RecordedRequest) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}

pub fn app() -> Router {
    app_with_state(MockState::default())
}

pub fn app_with_state(state: MockState) -> Router {
    let api = Router::new()
        .route("/quotes", get(list_quotes).post(create_quote))
        .route(
            "/quotes/{id}",
            get(get_quote).patch(update_quote).delete(delete_quote),
        )
        .route("/quotes/{id}/submit", post(submit_quote))
        .route("/users", get(list_users))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/dealrooms/{id}/files", post(upload_file))
        .route("/documents/{id}", get(get_document))
        .route("/documents/{id}/download", get(download_document))
        .route("/webhooks", get(list_webhooks).post(create_webhook))
        .route("/webhooks/{id}", get(get_webhook).delete(delete_webhook))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state);
    Router::new().nest("/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

/// DealHub's error envelope.
pub fn error_body(message: &str) -> Value {
    json!({ "error": { "message": message } })
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(error_body(message))).into_response()
}

async fn guard(State(state): State<MockState>, request: Request, next: Next) -> Response {
    state.record(RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
    });
    debug!(method = %request.method(), uri = %request.uri(), "mock request");

    if !authorized(request.headers()) {
        return api_error(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    next.run(request).await
}

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|key| !key.is_empty());
    bearer && headers.contains_key("x-dealhub-version") && headers.contains_key("x-dealhub-subdomain")
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

fn find<'a>(records: &'a [Value], id: &str) -> Option<&'a Value> {
    records.iter().find(|r| r["id"] == id)
}

/// `cursor` is the offset of the next record, as issued in `next_cursor`.
fn page(records: &[Value], params: &HashMap<String, String>) -> Value {
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(100)
        .max(1);
    let start = params
        .get("cursor")
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(0)
        .min(records.len());
    let end = (start + limit).min(records.len());
    let has_more = end < records.len();
    json!({
        "data": &records[start..end],
        "pagination": {
            "has_more": has_more,
            "next_cursor": has_more.then(|| end.to_string()),
            "total_count": records.len(),
        }
    })
}

async fn list_quotes(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let db = state.db.read().await;
    let quotes: Vec<Value> = match params.get("status") {
        Some(status) => db
            .quotes
            .iter()
            .filter(|q| q["status"] == status.as_str())
            .cloned()
            .collect(),
        None => db.quotes.clone(),
    };
    Json(page(&quotes, &params))
}

async fn create_quote(State(state): State<MockState>, Json(input): Json<Map<String, Value>>) -> Response {
    let named = input
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.is_empty());
    if !named {
        let body = json!({
            "error": {
                "message": "Invalid",
                "details": [ { "field": "name", "message": "required" } ]
            }
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
    }

    let mut quote = input;
    quote.insert("id".to_string(), json!(new_id("q")));
    quote.entry("status").or_insert(json!("draft"));
    let quote = Value::Object(quote);
    state.db.write().await.quotes.push(quote.clone());
    info!(id = %quote["id"], "quote created");
    (StatusCode::CREATED, Json(quote)).into_response()
}

async fn get_quote(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let db = state.db.read().await;
    match find(&db.quotes, &id) {
        Some(quote) => Json(quote.clone()).into_response(),
        None => api_error(StatusCode::NOT_FOUND, "Quote not found"),
    }
}

async fn update_quote(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> Response {
    let mut db = state.db.write().await;
    let Some(Value::Object(quote)) = db.quotes.iter_mut().find(|q| q["id"] == id.as_str()) else {
        return api_error(StatusCode::NOT_FOUND, "Quote not found");
    };
    quote.extend(input);
    Json(Value::Object(quote.clone())).into_response()
}

async fn delete_quote(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let mut db = state.db.write().await;
    let before = db.quotes.len();
    db.quotes.retain(|q| q["id"] != id.as_str());
    if db.quotes.len() == before {
        return api_error(StatusCode::NOT_FOUND, "Quote not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn submit_quote(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let mut db = state.db.write().await;
    let Some(Value::Object(quote)) = db.quotes.iter_mut().find(|q| q["id"] == id.as_str()) else {
        return api_error(StatusCode::NOT_FOUND, "Quote not found");
    };
    quote.insert("status".to_string(), json!("pending_approval"));
    Json(Value::Object(quote.clone())).into_response()
}

/// Claims further pages without handing out a cursor.
async fn list_users() -> Json<Value> {
    Json(json!({
        "data": [ { "id": "u_1", "email": "rep@acme.com" } ],
        "pagination": { "has_more": true }
    }))
}

/// Paginates like the quotes list but with a numeric `next_cursor` and a
/// string `total_count`.
async fn list_products(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let catalog: Vec<Value> = (1..=CATALOG_SIZE)
        .map(|i| json!({ "id": format!("p_{i}"), "sku": format!("SKU-{i}") }))
        .collect();
    let mut body = page(&catalog, &params);
    let pagination = &mut body["pagination"];
    let cursor = pagination["next_cursor"].as_str().and_then(|c| c.parse::<u64>().ok());
    if let Some(cursor) = cursor {
        pagination["next_cursor"] = json!(cursor);
    }
    pagination["total_count"] = json!(CATALOG_SIZE.to_string());
    Json(body)
}

async fn get_product(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    if id == FLAKY_PRODUCT {
        let mut db = state.db.write().await;
        db.flaky_hits += 1;
        if db.flaky_hits == 1 {
            return api_error(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable");
        }
    }
    Json(json!({ "id": id, "sku": "SKU-1", "unit_price": 49.5 })).into_response()
}

async fn upload_file(
    State(state): State<MockState>,
    Path(deal_room_id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return api_error(StatusCode::BAD_REQUEST, &e.body_text()),
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return api_error(StatusCode::BAD_REQUEST, &e.body_text()),
        };
        let file = UploadedFile {
            id: new_id("f"),
            deal_room_id,
            file_name,
            content_type,
            size: bytes.len(),
        };
        state.db.write().await.files.push(file.clone());
        return (StatusCode::CREATED, Json(file)).into_response();
    }
    api_error(StatusCode::BAD_REQUEST, "Missing file part")
}

async fn get_document(Path(id): Path<String>) -> Response {
    if id == "missing" {
        return api_error(StatusCode::NOT_FOUND, "Document not found");
    }
    Json(json!({
        "id": id,
        "file_name": format!("{id}.pdf"),
        "mime_type": "application/pdf",
        "status": "ready"
    }))
    .into_response()
}

async fn download_document(Path(id): Path<String>) -> Response {
    if id == "missing" {
        return api_error(StatusCode::NOT_FOUND, "Document not found");
    }
    ([(header::CONTENT_TYPE, "application/pdf")], DOCUMENT_BYTES).into_response()
}

async fn list_webhooks(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let db = state.db.read().await;
    Json(page(&db.webhooks, &params))
}

async fn create_webhook(State(state): State<MockState>, Json(input): Json<Map<String, Value>>) -> Response {
    if !input.get("url").and_then(Value::as_str).is_some_and(|u| !u.is_empty()) {
        return api_error(StatusCode::UNPROCESSABLE_ENTITY, "url is required");
    }
    let mut webhook = input;
    webhook.insert("id".to_string(), json!(new_id("wh")));
    webhook
        .entry("secret")
        .or_insert_with(|| json!(format!("whsec_{}", Uuid::new_v4().simple())));
    let webhook = Value::Object(webhook);
    state.db.write().await.webhooks.push(webhook.clone());
    (StatusCode::CREATED, Json(webhook)).into_response()
}

async fn get_webhook(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let db = state.db.read().await;
    match find(&db.webhooks, &id) {
        Some(webhook) => Json(webhook.clone()).into_response(),
        None => api_error(StatusCode::NOT_FOUND, "Webhook not found"),
    }
}

async fn delete_webhook(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let mut db = state.db.write().await;
    let before = db.webhooks.len();
    db.webhooks.retain(|w| w["id"] != id.as_str());
    if db.webhooks.len() == before {
        return api_error(StatusCode::NOT_FOUND, "Webhook not found");
    }
    StatusCode::NO_CONTENT.into_response()
}
