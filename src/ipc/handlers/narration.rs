use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{domain_err, parse_filters, required_str, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::narration::{self, NarrationFilters};
use crate::results;
use crate::speech::SpeakOptions;
use crate::users;
use serde_json::json;

fn handle_script(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student = match users::find_student(store, &student_id) {
        Ok(v) => v,
        Err(e) => return domain_err(req, e),
    };
    if !student.voice_over_enabled {
        return err(
            &req.id,
            "voice_over_disabled",
            "voice-over is disabled for this student",
            None,
        );
    }

    let mut filter = match parse_filters(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    filter.student_id = Some(student.id.clone());
    let records = match results::list_filtered(store, &filter) {
        Ok(v) => v,
        Err(e) => return domain_err(req, e),
    };
    if records.is_empty() {
        return err(
            &req.id,
            "validation",
            "no results to read with the current filters",
            None,
        );
    }

    let narration_filters = NarrationFilters {
        academic_year: filter.academic_year.clone(),
        semester: filter.semester.clone(),
        subject: filter.subject.clone(),
    };
    let text = narration::build_narration_script(
        &records,
        &student.name,
        &student.roll_number,
        &narration_filters,
    );
    let duration = narration::estimated_duration_ms(&text);
    let options = SpeakOptions::default();

    ok(
        &req.id,
        json!({
            "text": text,
            "rate": options.rate,
            "pitch": options.pitch,
            "estimatedDurationMs": duration,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "narration.script" => Some(handle_script(state, req)),
        _ => None,
    }
}
