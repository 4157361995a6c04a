use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{domain_err, parse_filters, required_str, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::model::{ResultRecord, Student};
use crate::report;
use crate::results;
use crate::users;
use serde_json::json;
use std::path::PathBuf;

fn student_results(
    state: &AppState,
    req: &Request,
) -> Result<(Student, Vec<ResultRecord>), serde_json::Value> {
    let store = store_ref(state, req)?;
    let student_id = required_str(req, "studentId")?;
    let student = users::find_student(store, &student_id).map_err(|e| domain_err(req, e))?;

    let mut filter = parse_filters(req)?;
    // The report is always scoped to the named student, whatever the filters say.
    filter.student_id = Some(student.id.clone());
    let records = results::list_filtered(store, &filter).map_err(|e| domain_err(req, e))?;
    Ok((student, records))
}

fn handle_result_report_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (student, records) = match student_results(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let model = report::build_result_report(&records, &student.name, &student.roll_number);
    ok(&req.id, json!(model))
}

fn handle_export_result_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_dir = match required_str(req, "outDir") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    let (student, records) = match student_results(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if records.is_empty() {
        return err(
            &req.id,
            "validation",
            "no results to export with the current filters",
            None,
        );
    }

    let model = report::build_result_report(&records, &student.name, &student.roll_number);
    let generated_on = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let (text, page_count) = report::render_report(&model, &generated_on);

    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        return err(&req.id, "io_failed", e.to_string(), None);
    }
    let out_path = out_dir.join(&model.file_name);
    if let Err(e) = std::fs::write(&out_path, text) {
        return err(&req.id, "io_failed", e.to_string(), None);
    }

    ok(
        &req.id,
        json!({
            "fileName": model.file_name,
            "outPath": out_path.to_string_lossy(),
            "pageCount": page_count,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.resultReportModel" => Some(handle_result_report_model(state, req)),
        "reports.exportResultReport" => Some(handle_export_result_report(state, req)),
        _ => None,
    }
}
