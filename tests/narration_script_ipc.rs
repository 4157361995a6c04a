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
    voice_over: bool,
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
            "rollNumber": "R-001",
            "voiceOverEnabled": voice_over
        }),
    );
    let student_id = created["user"]["id"].as_str().expect("id").to_string();

    let _ = request_ok(
        stdin,
        reader,
        "a1",
        "results.add",
        json!({
            "studentId": student_id,
            "subject": "Mathematics",
            "marksObtained": 92,
            "totalMarks": 100,
            "academicYear": "2024-2025",
            "semester": "1"
        }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "a2",
        "results.add",
        json!({
            "studentId": student_id,
            "subject": "Physics",
            "marksObtained": 48,
            "totalMarks": 100,
            "academicYear": "2024-2025",
            "semester": "2"
        }),
    );
    student_id
}

#[test]
fn script_is_deterministic_and_follows_the_clause_order() {
    let workspace = temp_dir("resulthub-narration-det");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let student_id = seed(&mut stdin, &mut reader, &workspace, true);

    let params = json!({
        "studentId": student_id,
        "filters": { "academicYear": "2024-2025", "semester": "1" }
    });
    let first = request_ok(&mut stdin, &mut reader, "n1", "narration.script", params.clone());
    let second = request_ok(&mut stdin, &mut reader, "n2", "narration.script", params);

    let text = first["text"].as_str().expect("text");
    assert_eq!(Some(text), second["text"].as_str(), "script must not vary");
    assert_eq!(
        text,
        "Results for Asha Verma, Roll Number R-001. \
         Academic Year 2024-2025. \
         Semester 1. \
         Total subjects: 1. Overall percentage: 92.00 percent. \
         Subject: Mathematics. Marks: 92 out of 100. Grade: A+. "
    );
    assert_eq!(first["rate"], json!(1.0));
    assert_eq!(first["pitch"], json!(1.0));
    assert_eq!(
        first["estimatedDurationMs"].as_u64(),
        Some(text.len() as u64 * 65)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unfiltered_script_covers_every_result_in_order() {
    let workspace = temp_dir("resulthub-narration-all");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let student_id = seed(&mut stdin, &mut reader, &workspace, true);

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "n",
        "narration.script",
        json!({ "studentId": student_id }),
    );
    let text = result["text"].as_str().expect("text");
    assert!(text.starts_with("Results for Asha Verma, Roll Number R-001. Total subjects: 2."));
    assert!(!text.contains("Academic Year 2024-2025."));
    let math = text.find("Subject: Mathematics.").expect("math clause");
    let physics = text.find("Subject: Physics.").expect("physics clause");
    assert!(math < physics, "clauses must follow insertion order");
    assert!(text.contains("Overall percentage: 70.00 percent."));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn narration_respects_the_voice_over_preference() {
    let workspace = temp_dir("resulthub-narration-pref");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let student_id = seed(&mut stdin, &mut reader, &workspace, false);

    let refused = request(
        &mut stdin,
        &mut reader,
        "n1",
        "narration.script",
        json!({ "studentId": student_id }),
    );
    assert_eq!(refused["ok"], json!(false));
    assert_eq!(refused["error"]["code"].as_str(), Some("voice_over_disabled"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "t",
        "students.setVoiceOver",
        json!({ "studentId": student_id, "enabled": true }),
    );
    let allowed = request(
        &mut stdin,
        &mut reader,
        "n2",
        "narration.script",
        json!({ "studentId": student_id }),
    );
    assert_eq!(allowed["ok"], json!(true));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn empty_filtered_set_is_a_validation_error() {
    let workspace = temp_dir("resulthub-narration-empty");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let student_id = seed(&mut stdin, &mut reader, &workspace, true);

    let refused = request(
        &mut stdin,
        &mut reader,
        "n",
        "narration.script",
        json!({ "studentId": student_id, "filters": { "subject": "History" } }),
    );
    assert_eq!(refused["ok"], json!(false));
    assert_eq!(refused["error"]["code"].as_str(), Some("validation"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
