use crate::ipc::error::ok;
use crate::ipc::helpers::{domain_err, parse_filters, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::model::ResultRecord;
use crate::results::{self, ResultFilter};
use crate::stats;
use crate::users;
use serde_json::json;

fn filtered_results(
    state: &AppState,
    req: &Request,
) -> Result<Vec<ResultRecord>, serde_json::Value> {
    let store = store_ref(state, req)?;
    let filter = parse_filters(req)?;
    results::list_filtered(store, &filter).map_err(|e| domain_err(req, e))
}

fn handle_grade_distribution(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_results(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "distribution": stats::grade_distribution(&records) }),
    )
}

fn handle_student_performance(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_results(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut averages = stats::per_student_average(&records);
    if let Some(top_n) = req.params.get("topN").and_then(|v| v.as_u64()) {
        averages.truncate(top_n as usize);
    }
    ok(&req.id, json!({ "students": averages }))
}

fn handle_subject_performance(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_results(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "subjects": stats::per_subject_average(&records) }),
    )
}

fn handle_progress(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match filtered_results(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "points": stats::time_series_progress(&records) }),
    )
}

/// Teacher-dashboard roll-up: headline counts, the five most recent results
/// (newest first), and the distribution/subject charts over everything.
fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let records = match results::list_filtered(store, &ResultFilter::default()) {
        Ok(v) => v,
        Err(e) => return domain_err(req, e),
    };
    let students = match users::list_students(store) {
        Ok(v) => v,
        Err(e) => return domain_err(req, e),
    };

    let recent: Vec<&ResultRecord> = records.iter().rev().take(5).collect();
    let total_subjects = results::list_options(store)
        .map(|o| o.subjects.len())
        .unwrap_or(0);

    ok(
        &req.id,
        json!({
            "totalStudents": students.len(),
            "totalResults": records.len(),
            "totalSubjects": total_subjects,
            "recentResults": recent,
            "gradeDistribution": stats::grade_distribution(&records),
            "subjectPerformance": stats::per_subject_average(&records),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.gradeDistribution" => Some(handle_grade_distribution(state, req)),
        "analytics.studentPerformance" => Some(handle_student_performance(state, req)),
        "analytics.subjectPerformance" => Some(handle_subject_performance(state, req)),
        "analytics.progress" => Some(handle_progress(state, req)),
        "analytics.overview" => Some(handle_overview(state, req)),
        _ => None,
    }
}
