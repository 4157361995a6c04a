use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::DomainError;
use crate::results::ResultFilter;
use crate::store::JsonFileStore;
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn store_ref<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a JsonFileStore, serde_json::Value> {
    state
        .store
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn domain_err(req: &Request, e: DomainError) -> serde_json::Value {
    err(&req.id, &e.code, e.message, e.details.map(|d| json!(d)))
}

/// `params.filters` is optional; dropdown sentinels ("all", "all_subjects",
/// empty string) normalize away before any matching happens.
pub fn parse_filters(req: &Request) -> Result<ResultFilter, serde_json::Value> {
    let Some(raw) = req.params.get("filters") else {
        return Ok(ResultFilter::default());
    };
    if raw.is_null() {
        return Ok(ResultFilter::default());
    }
    let filter: ResultFilter = serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("bad filters: {}", e), None))?;
    Ok(filter.normalized())
}
