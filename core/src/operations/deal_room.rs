use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::Params;

use super::fields::{list, Body};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["dealRoomId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("create", &["quoteId"], create),
    OperationSpec::new("update", &["dealRoomId"], update),
    OperationSpec::new("delete", &["dealRoomId"], delete),
    OperationSpec::new("addFile", &["dealRoomId"], add_file),
    OperationSpec::new("removeFile", &["dealRoomId", "fileId"], remove_file),
    OperationSpec::new("getActivity", &["dealRoomId"], get_activity),
    OperationSpec::new("getSigners", &["dealRoomId"], get_signers),
    OperationSpec::new("sendReminder", &["dealRoomId"], send_reminder),
    OperationSpec::new("expire", &["dealRoomId"], expire),
];

fn room(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/dealrooms/{}", p.segment("dealRoomId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(room(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/dealrooms", "filters")
}

fn create(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("additionalFields")?;
    let mut body = Body::new()
        .set("quote_id", p.str("quoteId")?)
        .truthy(&fields, &["accessCode"])
        .present(&fields, &["expirationDays", "allowDownload", "requireSignature"]);

    let signers = signers(fields.get("signers"));
    if !signers.is_empty() {
        body = body.set("signers", signers);
    }
    Ok(Call::post("/dealrooms").body(body.cleaned()).into())
}

/// `{signerValues: [{email, name}, ...]}` → `[{email, name}, ...]`.
fn signers(collection: Option<&Value>) -> Vec<Value> {
    collection
        .and_then(|c| c.get("signerValues"))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|s| json!({ "email": s.get("email"), "name": s.get("name") }))
                .collect()
        })
        .unwrap_or_default()
}

fn update(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("updateFields")?;
    let body = Body::new()
        .truthy(&fields, &["accessCode", "expirationDate"])
        .present(&fields, &["allowDownload", "requireSignature"])
        .cleaned();
    Ok(Call::new(HttpMethod::Patch, room(p)?).body(body).into())
}

fn delete(p: &Params) -> Result<Plan, ApiError> {
    let id = p.str("dealRoomId")?;
    Ok(Call::new(HttpMethod::Delete, room(p)?)
        .respond_with(json!({ "success": true, "dealRoomId": id }))
        .into())
}

fn add_file(p: &Params) -> Result<Plan, ApiError> {
    Ok(Plan::Upload {
        path: format!("{}/files", room(p)?),
        binary_property: p
            .opt_str("binaryPropertyName")?
            .unwrap_or_else(|| "data".to_string()),
        file_name: p.opt_str("fileName")?,
    })
}

fn remove_file(p: &Params) -> Result<Plan, ApiError> {
    let room_id = p.str("dealRoomId")?;
    let file_id = p.str("fileId")?;
    let path = format!("{}/files/{}", room(p)?, p.segment("fileId")?);
    Ok(Call::new(HttpMethod::Delete, path)
        .respond_with(json!({ "success": true, "dealRoomId": room_id, "fileId": file_id }))
        .into())
}

fn get_activity(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/activity", room(p)?))
        .data_or_response()
        .into())
}

fn get_signers(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/signers", room(p)?))
        .data_or_response()
        .into())
}

fn send_reminder(p: &Params) -> Result<Plan, ApiError> {
    let body = Body::new()
        .set("signer_email", p.opt_str("signerEmail")?)
        .set("custom_message", p.opt_str("customMessage")?)
        .cleaned();
    Ok(Call::post(format!("{}/remind", room(p)?)).body(body).into())
}

fn expire(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::post(format!("{}/expire", room(p)?)).into())
}
