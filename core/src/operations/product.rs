use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::Params;

use super::fields::{list, Body};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["productId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("create", &["sku", "name", "unitPrice"], create),
    OperationSpec::new("update", &["productId"], update),
    OperationSpec::new("delete", &["productId"], delete),
    OperationSpec::new("getPricing", &["productId"], get_pricing),
    OperationSpec::new("updatePricing", &["productId", "pricingData"], update_pricing),
    OperationSpec::new("getAttributes", &["productId"], get_attributes),
    OperationSpec::new("addToBundle", &["bundleId", "productId"], add_to_bundle),
    OperationSpec::new("removeFromBundle", &["bundleId", "productId"], remove_from_bundle),
];

fn product(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/products/{}", p.segment("productId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(product(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/products", "filters")
}

fn create(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("additionalFields")?;
    let body = Body::new()
        .set("sku", p.str("sku")?)
        .set("name", p.str("name")?)
        .set("unit_price", p.number("unitPrice")?)
        .truthy(&fields, &["description", "category", "currency", "pricingModel"])
        .present(&fields, &["isActive"])
        .cleaned();
    Ok(Call::post("/products").body(body).into())
}

fn update(p: &Params) -> Result<Plan, ApiError> {
    let fields = p.collection("updateFields")?;
    let body = Body::new()
        .truthy(&fields, &["sku", "name", "description", "category", "pricingModel"])
        .present(&fields, &["unitPrice", "isActive"])
        .cleaned();
    Ok(Call::new(HttpMethod::Patch, product(p)?).body(body).into())
}

fn delete(p: &Params) -> Result<Plan, ApiError> {
    let id = p.str("productId")?;
    Ok(Call::new(HttpMethod::Delete, product(p)?)
        .respond_with(json!({ "success": true, "productId": id }))
        .into())
}

fn get_pricing(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/pricing", product(p)?)).into())
}

fn update_pricing(p: &Params) -> Result<Plan, ApiError> {
    let Value::Object(body) = p.json("pricingData")? else {
        return Err(ApiError::invalid("pricingData", "expected a JSON object"));
    };
    Ok(Call::new(HttpMethod::Put, format!("{}/pricing", product(p)?))
        .body(body)
        .into())
}

fn get_attributes(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/attributes", product(p)?))
        .data_or_response()
        .into())
}

fn add_to_bundle(p: &Params) -> Result<Plan, ApiError> {
    let body = Body::new()
        .set("product_id", p.str("productId")?)
        .set("quantity", p.u64_or("quantity", 1)?)
        .raw();
    Ok(Call::post(format!("/products/{}/bundle-items", p.segment("bundleId")?))
        .body(body)
        .into())
}

fn remove_from_bundle(p: &Params) -> Result<Plan, ApiError> {
    let bundle_id = p.str("bundleId")?;
    let product_id = p.str("productId")?;
    let path = format!(
        "/products/{}/bundle-items/{}",
        p.segment("bundleId")?,
        p.segment("productId")?
    );
    Ok(Call::new(HttpMethod::Delete, path)
        .respond_with(json!({
            "success": true,
            "productId": product_id,
            "bundleId": bundle_id
        }))
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_call(build: fn(&Params) -> Result<Plan, ApiError>, params: Value) -> Call {
        match build(&Params::from_value(params)).unwrap() {
            Plan::Call(call) => call,
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn create_keeps_numeric_price() {
        let call = build_call(
            create,
            json!({
                "sku": "SKU-1",
                "name": "Seat",
                "unitPrice": 49.5,
                "additionalFields": { "pricingModel": "per_unit", "isActive": false, "category": "" }
            }),
        );
        assert_eq!(
            Value::Object(call.body.unwrap()),
            json!({
                "sku": "SKU-1",
                "name": "Seat",
                "unit_price": 49.5,
                "pricing_model": "per_unit",
                "is_active": false
            })
        );
    }

    #[test]
    fn update_forwards_zero_price() {
        let call = build_call(
            update,
            json!({ "productId": "p_1", "updateFields": { "unitPrice": 0 } }),
        );
        assert_eq!(call.method, HttpMethod::Patch);
        assert_eq!(Value::Object(call.body.unwrap()), json!({ "unit_price": 0 }));
    }

    #[test]
    fn pricing_data_accepts_text_but_not_arrays() {
        let call = build_call(
            update_pricing,
            json!({ "productId": "p_1", "pricingData": "{\"tiers\":[{\"min\":1,\"price\":10}]}" }),
        );
        assert_eq!(call.method, HttpMethod::Put);
        assert_eq!(call.path, "/products/p_1/pricing");
        assert_eq!(call.body.unwrap()["tiers"][0]["price"], 10);

        let err = update_pricing(&Params::from_value(json!({ "productId": "p_1", "pricingData": "[1]" })))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { .. }));
    }

    #[test]
    fn bundle_quantity_defaults_to_one() {
        let call = build_call(add_to_bundle, json!({ "bundleId": "b_1", "productId": "p_2" }));
        assert_eq!(call.path, "/products/b_1/bundle-items");
        assert_eq!(
            Value::Object(call.body.unwrap()),
            json!({ "product_id": "p_2", "quantity": 1 })
        );
    }

    #[test]
    fn remove_from_bundle_acknowledges() {
        let call = build_call(remove_from_bundle, json!({ "bundleId": "b_1", "productId": "p_2" }));
        assert_eq!(call.path, "/products/b_1/bundle-items/p_2");
        assert_eq!(
            call.output,
            crate::operations::Output::Fixed(json!({
                "success": true,
                "productId": "p_2",
                "bundleId": "b_1"
            }))
        );
    }
}
