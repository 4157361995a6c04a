use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{domain_err, required_str, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::users::{self, Registration};
use serde_json::json;

fn parse_role(req: &Request) -> Result<Role, serde_json::Value> {
    let raw = req
        .params
        .get("role")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    serde_json::from_value(raw).map_err(|_| {
        err(
            &req.id,
            "bad_params",
            "role must be \"student\" or \"teacher\"",
            None,
        )
    })
}

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let registration: Registration = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("bad registration: {}", e),
                None,
            )
        }
    };

    match users::register(store, &registration) {
        Ok(user) => ok(&req.id, json!({ "user": user.public_profile() })),
        Err(e) => domain_err(req, e),
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let role = match parse_role(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match users::authenticate(store, role, &email, &password) {
        Ok(user) => ok(&req.id, json!({ "user": user.public_profile() })),
        Err(e) => domain_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.register" => Some(handle_register(state, req)),
        "auth.login" => Some(handle_login(state, req)),
        _ => None,
    }
}
