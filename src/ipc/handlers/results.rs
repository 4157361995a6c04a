use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{domain_err, parse_filters, required_str, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::results::{self, NewResult, ResultPatch};
use serde_json::json;

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let input: NewResult = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("bad result: {}", e), None),
    };
    match results::add_result(store, &input) {
        Ok(record) => ok(&req.id, json!({ "result": record })),
        Err(e) => domain_err(req, e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result_id = match required_str(req, "resultId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let patch: ResultPatch = match req.params.get("patch") {
        None => ResultPatch::default(),
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", format!("bad patch: {}", e), None),
        },
    };
    match results::update_result(store, &result_id, &patch) {
        Ok(record) => ok(&req.id, json!({ "result": record })),
        Err(e) => domain_err(req, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result_id = match required_str(req, "resultId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match results::delete_result(store, &result_id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => domain_err(req, e),
    }
}

fn handle_list_by_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match results::list_by_student(store, &student_id) {
        Ok(records) => ok(&req.id, json!({ "results": records })),
        Err(e) => domain_err(req, e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let filter = match parse_filters(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match results::list_filtered(store, &filter) {
        Ok(records) => {
            let total = records.len();
            ok(&req.id, json!({ "results": records, "total": total }))
        }
        Err(e) => domain_err(req, e),
    }
}

fn handle_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match results::list_options(store) {
        Ok(options) => ok(&req.id, json!(options)),
        Err(e) => domain_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.add" => Some(handle_add(state, req)),
        "results.update" => Some(handle_update(state, req)),
        "results.delete" => Some(handle_delete(state, req)),
        "results.listByStudent" => Some(handle_list_by_student(state, req)),
        "results.list" => Some(handle_list(state, req)),
        "results.options" => Some(handle_options(state, req)),
        _ => None,
    }
}
