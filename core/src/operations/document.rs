use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::Params;

use super::fields::{list, truthy, Body};
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["documentId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("generate", &["quoteId", "templateId"], generate),
    OperationSpec::new("download", &["documentId"], download),
    OperationSpec::new("delete", &["documentId"], delete),
    OperationSpec::new("getTemplates", &[], get_templates),
    OperationSpec::new("preview", &["quoteId", "templateId"], preview),
];

fn document(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/documents/{}", p.segment("documentId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(document(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/documents", "filters")
}

fn generate(p: &Params) -> Result<Plan, ApiError> {
    let options = p.collection("generateOptions")?;
    let mut body = Body::new()
        .set("quote_id", p.str("quoteId")?)
        .set("template_id", p.str("templateId")?)
        .truthy(&options, &["format", "language"]);
    // Version 0 means "current" and is left to the server.
    if let Some(version) = options.get("versionNumber").filter(|v| truthy(v)) {
        body = body.set("version_number", version.clone());
    }
    let body = body
        .present(&options, &["includeLineItems", "includeTerms"])
        .cleaned();
    Ok(Call::post("/documents/generate").body(body).into())
}

fn download(p: &Params) -> Result<Plan, ApiError> {
    let id = p.str("documentId")?;
    let metadata_path = document(p)?;
    Ok(Plan::Download {
        download_path: format!("{metadata_path}/download"),
        metadata_path,
        binary_property: p
            .opt_str("binaryPropertyName")?
            .unwrap_or_else(|| "data".to_string()),
        default_file_name: format!("document_{id}.pdf"),
    })
}

fn delete(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::new(HttpMethod::Delete, document(p)?).into())
}

fn get_templates(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/documents/templates", "templateFilters")
}

fn preview(p: &Params) -> Result<Plan, ApiError> {
    let body = Body::new()
        .set("quote_id", p.str("quoteId")?)
        .set("template_id", p.str("templateId")?)
        .raw();
    Ok(Call::post("/documents/preview").body(body).into())
}
