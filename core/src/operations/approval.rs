use crate::error::ApiError;
use crate::params::Params;

use super::fields::{list, Body};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["approvalId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("approve", &["approvalId"], approve),
    OperationSpec::new("reject", &["approvalId", "rejectionReason"], reject),
    OperationSpec::new("delegate", &["approvalId", "delegateToUserId"], delegate),
    OperationSpec::new("getHistory", &["quoteId"], get_history),
];

fn approval(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/approvals/{}", p.segment("approvalId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(approval(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/approvals", "filters")
}

fn approve(p: &Params) -> Result<Plan, ApiError> {
    let options = p.collection("options")?;
    let body = Body::new().truthy(&options, &["comments"]).cleaned();
    Ok(Call::post(format!("{}/approve", approval(p)?)).body(body).into())
}

fn reject(p: &Params) -> Result<Plan, ApiError> {
    let body = Body::new()
        .set("rejection_reason", p.str("rejectionReason")?)
        .raw();
    Ok(Call::post(format!("{}/reject", approval(p)?)).body(body).into())
}

fn delegate(p: &Params) -> Result<Plan, ApiError> {
    let options = p.collection("delegateOptions")?;
    let body = Body::new()
        .set("delegate_to_user_id", p.str("delegateToUserId")?)
        .truthy(&options, &["reason"])
        .cleaned();
    Ok(Call::post(format!("{}/delegate", approval(p)?)).body(body).into())
}

fn get_history(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("/quotes/{}/approvals/history", p.segment("quoteId")?))
        .data_or_response()
        .into())
}
