use crate::error::ApiError;
use crate::params::Params;

use super::fields::{list, Body};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["versionId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("getCurrent", &[], get_current),
    OperationSpec::new("getProducts", &["versionId"], get_products),
    OperationSpec::new("getPlaybooks", &["versionId"], get_playbooks),
    OperationSpec::new("publish", &["versionId"], publish),
    OperationSpec::new("rollback", &["versionId"], rollback),
];

fn version(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/versions/{}", p.segment("versionId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(version(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/versions", "filters")
}

fn get_current(_: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get("/versions/current").into())
}

fn get_products(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/products", version(p)?)).data_or_response().into())
}

fn get_playbooks(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/playbooks", version(p)?)).data_or_response().into())
}

fn publish(p: &Params) -> Result<Plan, ApiError> {
    let options = p.collection("publishOptions")?;
    let body = Body::new()
        .truthy(&options, &["name", "description"])
        .cleaned();
    Ok(Call::post(format!("{}/publish", version(p)?)).body(body).into())
}

fn rollback(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::post(format!("{}/rollback", version(p)?)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use serde_json::{json, Value};

    #[test]
    fn publish_only_sends_named_options() {
        let params = Params::from_value(json!({
            "versionId": "v_2",
            "publishOptions": { "name": "Q3 pricing", "description": "" }
        }));
        let Plan::Call(call) = publish(&params).unwrap() else {
            panic!("expected call");
        };
        assert_eq!(call.method, HttpMethod::Post);
        assert_eq!(call.path, "/versions/v_2/publish");
        assert_eq!(Value::Object(call.body.unwrap()), json!({ "name": "Q3 pricing" }));
    }

    #[test]
    fn current_version_needs_no_id() {
        let Plan::Call(call) = get_current(&Params::default()).unwrap() else {
            panic!("expected call");
        };
        assert_eq!(call.path, "/versions/current");
    }
}
