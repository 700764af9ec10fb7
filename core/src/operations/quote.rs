use serde_json::json;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::Params;

use super::fields::{comma_list, list, Body};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["quoteId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("create", &["name"], create),
    OperationSpec::new("update", &["quoteId"], update),
    OperationSpec::new("delete", &["quoteId"], delete),
    OperationSpec::new("submit", &["quoteId"], submit),
    OperationSpec::new("approve", &["quoteId"], approve),
    OperationSpec::new("reject", &["quoteId", "rejectionReason"], reject),
    OperationSpec::new("publish", &["quoteId"], publish),
    OperationSpec::new("clone", &["quoteId"], clone),
    OperationSpec::new("getVersions", &["quoteId"], get_versions),
    OperationSpec::new("setActiveVersion", &["quoteId", "versionNumber"], set_active_version),
    OperationSpec::new("exportPdf", &["quoteId"], export_pdf),
    OperationSpec::new("exportExcel", &["quoteId"], export_excel),
];

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("/quotes/{}", p.segment("quoteId")?)).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/quotes", "filters")
}

fn create(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("additionalFields")?;
    let body = Body::new()
        .set("name", p.str("name")?)
        .truthy(&fields, &["opportunityId", "playbookId", "currency", "expirationDate"])
        .json(&fields, "metadata")?
        .cleaned();
    Ok(Call::post("/quotes").body(body).into())
}

fn update(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("updateFields")?;
    let body = Body::new()
        .truthy(&fields, &["name", "currency", "expirationDate"])
        .json(&fields, "metadata")?
        .cleaned();
    Ok(Call::new(HttpMethod::Patch, format!("/quotes/{}", p.segment("quoteId")?))
        .body(body)
        .into())
}

fn delete(p: &Params) -> Result<Plan, ApiError> {
    let id = p.str("quoteId")?;
    Ok(Call::new(HttpMethod::Delete, format!("/quotes/{}", p.segment("quoteId")?))
        .respond_with(json!({ "success": true, "quoteId": id }))
        .into())
}

fn submit(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::post(format!("/quotes/{}/submit", p.segment("quoteId")?)).into())
}

fn approve(p: &Params) -> Result<Plan, ApiError> {
    let body = Body::new()
        .set("comments", p.opt_str("approvalComments")?)
        .cleaned();
    Ok(Call::post(format!("/quotes/{}/approve", p.segment("quoteId")?))
        .body(body)
        .into())
}

fn reject(p: &Params) -> Result<Plan, ApiError> {
    let body = Body::new().set("reason", p.str("rejectionReason")?).raw();
    Ok(Call::post(format!("/quotes/{}/reject", p.segment("quoteId")?))
        .body(body)
        .into())
}

fn publish(p: &Params) -> Result<Plan, ApiError> {
    let options = p.collection("publishOptions")?;
    let mut body = Body::new().present(&options, &["createDealRoom", "notifyRecipients"]);
    if let Some(emails) = options.get("recipientEmails").and_then(|v| v.as_str()) {
        body = body.set("recipient_emails", comma_list(emails));
    }
    Ok(Call::post(format!("/quotes/{}/publish", p.segment("quoteId")?))
        .body(body.cleaned())
        .into())
}

fn clone(p: &Params) -> Result<Plan, ApiError> {
    let options = p.collection("cloneOptions")?;
    let body = Body::new()
        .renamed(&options, "newName", "name")
        .present(&options, &["includeLineItems"])
        .cleaned();
    Ok(Call::post(format!("/quotes/{}/clone", p.segment("quoteId")?))
        .body(body)
        .into())
}

fn get_versions(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("/quotes/{}/versions", p.segment("quoteId")?))
        .data_or_response()
        .into())
}

fn set_active_version(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::post(format!(
        "/quotes/{}/versions/{}/activate",
        p.segment("quoteId")?,
        p.number("versionNumber")?
    ))
    .into())
}

fn export(p: &Params, format: &str) -> Result<Plan, ApiError> {
    let body = Body::new().set("format", format).raw();
    Ok(Call::post(format!("/quotes/{}/export", p.segment("quoteId")?))
        .body(body)
        .into())
}

fn export_pdf(p: &Params) -> Result<Plan, ApiError> {
    export(p, "pdf")
}

fn export_excel(p: &Params) -> Result<Plan, ApiError> {
    export(p, "xlsx")
}
