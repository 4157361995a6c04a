use crate::model::{fmt_marks, ResultRecord};
use serde::Deserialize;
use std::fmt::Write;

pub const SPEECH_RATE: f64 = 1.0;
pub const SPEECH_PITCH: f64 = 1.0;

// The speech capability reports no completion event, so callers estimate the
// utterance length from the script instead.
const MS_PER_CHAR: u64 = 65;

/// Filter values active when the script was requested. `None` means the
/// "all" dropdown choice and produces no clause.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationFilters {
    pub academic_year: Option<String>,
    pub semester: Option<String>,
    pub subject: Option<String>,
}

/// Builds the flat narration script: greeting, active filter clauses,
/// summary, then one clause per result in iteration order. Purely a function
/// of its inputs; repeated calls produce identical bytes.
pub fn build_narration_script(
    results: &[ResultRecord],
    student_name: &str,
    roll_number: &str,
    filters: &NarrationFilters,
) -> String {
    let mut script = format!("Results for {}, Roll Number {}. ", student_name, roll_number);

    if let Some(year) = &filters.academic_year {
        let _ = write!(script, "Academic Year {}. ", year);
    }
    if let Some(semester) = &filters.semester {
        let _ = write!(script, "Semester {}. ", semester);
    }
    if let Some(subject) = &filters.subject {
        let _ = write!(script, "Subject {}. ", subject);
    }

    let total_obtained: f64 = results.iter().map(|r| r.marks_obtained).sum();
    let total_possible: f64 = results.iter().map(|r| r.total_marks).sum();
    let overall = if total_possible > 0.0 {
        total_obtained / total_possible * 100.0
    } else {
        0.0
    };
    let _ = write!(
        script,
        "Total subjects: {}. Overall percentage: {:.2} percent. ",
        results.len(),
        overall
    );

    for record in results {
        let _ = write!(
            script,
            "Subject: {}. Marks: {} out of {}. Grade: {}. ",
            record.subject,
            fmt_marks(record.marks_obtained),
            fmt_marks(record.total_marks),
            record.grade
        );
    }

    script
}

pub fn estimated_duration_ms(script: &str) -> u64 {
    script.len() as u64 * MS_PER_CHAR
}
