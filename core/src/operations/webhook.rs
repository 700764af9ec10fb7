use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::Params;

use super::fields::{list, Body};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["webhookId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("create", &["url", "events"], create),
    OperationSpec::new("update", &["webhookId"], update),
    OperationSpec::new("delete", &["webhookId"], delete),
    OperationSpec::new("getEvents", &[], get_events),
    OperationSpec::new("test", &["webhookId", "eventType"], send_test),
];

fn webhook(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/webhooks/{}", p.segment("webhookId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(webhook(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/webhooks", "filters")
}

fn create(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("additionalFields")?;
    let body = Body::new()
        .set("url", p.str("url")?)
        .set("events", p.str_list("events")?)
        .truthy(&fields, &["description", "secret"])
        .present(&fields, &["isActive"])
        .cleaned();
    Ok(Call::post("/webhooks").body(body).into())
}

fn update(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("updateFields")?;
    let body = Body::new()
        .truthy(&fields, &["url", "events", "description", "secret"])
        .present(&fields, &["isActive"])
        .cleaned();
    Ok(Call::new(HttpMethod::Patch, webhook(p)?).body(body).into())
}

fn delete(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::new(HttpMethod::Delete, webhook(p)?).into())
}

fn get_events(_: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get("/webhooks/events").data_or_response().into())
}

fn send_test(p: &Params) -> Result<Plan, ApiError> {
    let body = Body::new().set("event_type", p.str("eventType")?).raw();
    Ok(Call::post(format!("{}/test", webhook(p)?)).body(body).into())
}
