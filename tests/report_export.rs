use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_resulthubd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn resulthubd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn seed(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) -> String {
    let _ = request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let created = request_ok(
        stdin,
        reader,
        "reg",
        "auth.register",
        json!({
            "role": "student",
            "name": "Asha Verma",
            "email": "asha@school.test",
            "password": "pw",
            "rollNumber": "R-001"
        }),
    );
    created["user"]["id"].as_str().expect("id").to_string()
}

fn add_result(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    student_id: &str,
    subject: &str,
    marks: f64,
    year: &str,
    semester: &str,
) {
    let _ = request_ok(
        stdin,
        reader,
        id,
        "results.add",
        json!({
            "studentId": student_id,
            "subject": subject,
            "marksObtained": marks,
            "totalMarks": 100,
            "academicYear": year,
            "semester": semester
        }),
    );
}

#[test]
fn report_model_groups_by_period_with_rederived_summaries() {
    let workspace = temp_dir("resulthub-report-model");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let student_id = seed(&mut stdin, &mut reader, &workspace);

    add_result(&mut stdin, &mut reader, "a1", &student_id, "Mathematics", 95.0, "2024-2025", "1");
    add_result(&mut stdin, &mut reader, "a2", &student_id, "Physics", 10.0, "2024-2025", "1");
    add_result(&mut stdin, &mut reader, "a3", &student_id, "Chemistry", 90.0, "2023-2024", "2");

    let model = request_ok(
        &mut stdin,
        &mut reader,
        "m",
        "reports.resultReportModel",
        json!({ "studentId": student_id }),
    );
    assert_eq!(model["studentName"], "Asha Verma");
    assert_eq!(model["rollNumber"], "R-001");
    assert_eq!(model["fileName"], "Asha_Verma_Result_Report.txt");

    let groups = model["groups"].as_array().expect("groups");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["period"], "2024-2025 - Semester 1");
    assert_eq!(groups[1]["period"], "2023-2024 - Semester 2");

    // 95 + 10 out of 200 is 52.5%, a D overall even though the rows carry
    // an A+ and an F.
    assert_eq!(groups[0]["totalObtained"], json!(105.0));
    assert_eq!(groups[0]["totalPossible"], json!(200.0));
    assert_eq!(groups[0]["percentage"], json!(52.5));
    assert_eq!(groups[0]["overallGrade"], "D");
    let rows = groups[0]["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["subject"], "Mathematics");
    assert_eq!(rows[0]["grade"], "A+");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn export_writes_a_paginated_document_with_footer_on_every_page() {
    let workspace = temp_dir("resulthub-report-export");
    let out_dir = temp_dir("resulthub-report-export-out");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let student_id = seed(&mut stdin, &mut reader, &workspace);

    // Enough rows to spill onto more than one page.
    for i in 0..60 {
        let semester = format!("{}", (i % 8) + 1);
        add_result(
            &mut stdin,
            &mut reader,
            &format!("a{}", i),
            &student_id,
            &format!("Subject {}", i),
            50.0,
            "2024-2025",
            &semester,
        );
    }

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "x",
        "reports.exportResultReport",
        json!({ "studentId": student_id, "outDir": out_dir.to_string_lossy() }),
    );
    assert_eq!(exported["fileName"], "Asha_Verma_Result_Report.txt");
    let page_count = exported["pageCount"].as_u64().expect("pageCount") as usize;
    assert!(page_count > 1, "expected a multi-page report");

    let out_path = out_dir.join("Asha_Verma_Result_Report.txt");
    let text = std::fs::read_to_string(&out_path).expect("read exported report");
    let pages: Vec<&str> = text.split('\u{c}').collect();
    assert_eq!(pages.len(), page_count);
    for (i, page) in pages.iter().enumerate() {
        assert!(page.contains("Result Hub - Official Result Document"));
        assert!(page.contains(&format!("Page {} of {}", i + 1, page_count)));
    }
    assert!(pages[0].contains("Student Name: Asha Verma"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn export_with_no_matching_results_is_refused() {
    let workspace = temp_dir("resulthub-report-empty");
    let out_dir = temp_dir("resulthub-report-empty-out");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let student_id = seed(&mut stdin, &mut reader, &workspace);

    add_result(&mut stdin, &mut reader, "a1", &student_id, "Mathematics", 95.0, "2024-2025", "1");

    let refused = request(
        &mut stdin,
        &mut reader,
        "x",
        "reports.exportResultReport",
        json!({
            "studentId": student_id,
            "outDir": out_dir.to_string_lossy(),
            "filters": { "academicYear": "1999-2000" }
        }),
    );
    assert_eq!(refused["ok"], json!(false));
    assert_eq!(
        refused["error"]["code"].as_str(),
        Some("validation"),
        "{}",
        refused
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn report_filters_scope_the_included_results() {
    let workspace = temp_dir("resulthub-report-filters");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let student_id = seed(&mut stdin, &mut reader, &workspace);

    add_result(&mut stdin, &mut reader, "a1", &student_id, "Mathematics", 80.0, "2024-2025", "1");
    add_result(&mut stdin, &mut reader, "a2", &student_id, "Physics", 60.0, "2023-2024", "2");

    let model = request_ok(
        &mut stdin,
        &mut reader,
        "m",
        "reports.resultReportModel",
        json!({ "studentId": student_id, "filters": { "academicYear": "2024-2025" } }),
    );
    let groups = model["groups"].as_array().expect("groups");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["period"], "2024-2025 - Semester 1");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
