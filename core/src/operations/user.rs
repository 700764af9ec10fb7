use crate::error::ApiError;
use crate::params::Params;

use super::fields::{filter_query, list};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["userId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("getCurrent", &[], get_current),
    OperationSpec::new("getTeams", &["userId"], get_teams),
    OperationSpec::new("getQuotes", &["userId"], get_quotes),
    OperationSpec::new("getActivity", &["userId"], get_activity),
];

fn user(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/users/{}", p.segment("userId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(user(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/users", "filters")
}

fn get_current(_: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get("/users/me").into())
}

fn get_teams(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/teams", user(p)?)).data_or_response().into())
}

fn get_quotes(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/quotes", user(p)?)).data_or_response().into())
}

fn get_activity(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/activity", user(p)?))
        .query(filter_query(p, "activityFilters")?)
        .data_or_response()
        .into())
}
