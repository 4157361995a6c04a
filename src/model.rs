use crate::grading::Grade;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn id_prefix(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

/// Student account. Persisted with the application's historical camelCase
/// field names (`rollNumber`, `voiceOverEnabled`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub roll_number: String,
    #[serde(default)]
    pub voice_over_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// One subject-grade record for one student in one academic year/semester.
/// Persisted with snake_case keys, matching the stored `results` collection.
/// `student_name` is a snapshot taken at creation time; later renames do not
/// rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub subject: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub academic_year: String,
    pub semester: String,
    pub grade: Grade,
}

/// Repository-level failure, serialized 1:1 into the IPC error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct DomainError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DomainError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for DomainError {}

/// Record ids follow the `<prefix>_<unix-millis>` scheme. Two inserts in the
/// same millisecond would collide, so the counter bumps until the id is free.
pub fn timestamp_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let id = format!("{}_{}", prefix, millis);
        if !taken(&id) {
            return id;
        }
        millis += 1;
    }
}

/// Mark values print the way the UI shows them: whole numbers without a
/// trailing `.0`, fractional values as-is.
pub fn fmt_marks(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
