use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::Params;

use super::fields::{list, Body};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["opportunityId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("create", &["accountName"], create),
    OperationSpec::new("update", &["opportunityId"], update),
    OperationSpec::new("getQuotes", &["opportunityId"], get_quotes),
    OperationSpec::new("sync", &["opportunityId"], sync),
];

fn opportunity(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/opportunities/{}", p.segment("opportunityId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(opportunity(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/opportunities", "filters")
}

fn create(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("additionalFields")?;
    let body = Body::new()
        .set("account_name", p.str("accountName")?)
        .truthy(
            &fields,
            &["crmOpportunityId", "contactName", "contactEmail", "currency", "stage", "closeDate"],
        )
        .present(&fields, &["amount", "probability"])
        .cleaned();
    Ok(Call::post("/opportunities").body(body).into())
}

fn update(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("updateFields")?;
    let body = Body::new()
        .truthy(
            &fields,
            &["accountName", "contactName", "contactEmail", "stage", "closeDate"],
        )
        .present(&fields, &["amount", "probability"])
        .cleaned();
    Ok(Call::new(HttpMethod::Patch, opportunity(p)?).body(body).into())
}

fn get_quotes(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/quotes", opportunity(p)?))
        .data_or_response()
        .into())
}

fn sync(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::post(format!("{}/sync", opportunity(p)?)).into())
}
