use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{domain_err, required_str, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::users;
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match users::list_students(store) {
        Ok(students) => {
            let profiles: Vec<serde_json::Value> = students
                .iter()
                .map(users::student_public_profile)
                .collect();
            ok(&req.id, json!({ "students": profiles }))
        }
        Err(e) => domain_err(req, e),
    }
}

fn handle_find_by_roll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let roll_number = match required_str(req, "rollNumber") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match users::find_student_by_roll(store, &roll_number) {
        Ok(student) => ok(
            &req.id,
            json!({ "student": users::student_public_profile(&student) }),
        ),
        Err(e) => domain_err(req, e),
    }
}

fn handle_set_voice_over(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(enabled) = req.params.get("enabled").and_then(|v| v.as_bool()) else {
        return err(&req.id, "bad_params", "missing enabled", None);
    };
    match users::set_voice_over(store, &student_id, enabled) {
        Ok(student) => ok(
            &req.id,
            json!({ "student": users::student_public_profile(&student) }),
        ),
        Err(e) => domain_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.findByRoll" => Some(handle_find_by_roll(state, req)),
        "students.setVoiceOver" => Some(handle_set_voice_over(state, req)),
        _ => None,
    }
}
