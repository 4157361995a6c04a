use crate::grading;
use crate::model::{timestamp_id, DomainError, ResultRecord};
use crate::store::{self, RecordStore, RESULTS};
use crate::users;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    pub student_id: String,
    pub subject: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub academic_year: String,
    pub semester: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPatch {
    pub subject: Option<String>,
    pub academic_year: Option<String>,
    pub semester: Option<String>,
    pub marks_obtained: Option<f64>,
    pub total_marks: Option<f64>,
}

/// Optional, AND-combined predicates over the result collection. The UI's
/// "all …" dropdown sentinels normalize to no filter at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFilter {
    pub student_id: Option<String>,
    pub subject: Option<String>,
    pub academic_year: Option<String>,
    pub semester: Option<String>,
    pub search: Option<String>,
}

fn normalize_field(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "all" || trimmed.starts_with("all_") {
        return None;
    }
    Some(trimmed.to_string())
}

impl ResultFilter {
    pub fn normalized(self) -> Self {
        Self {
            student_id: normalize_field(self.student_id),
            subject: normalize_field(self.subject),
            academic_year: normalize_field(self.academic_year),
            semester: normalize_field(self.semester),
            search: normalize_field(self.search),
        }
    }

    pub fn matches(&self, record: &ResultRecord) -> bool {
        if let Some(student_id) = &self.student_id {
            if &record.student_id != student_id {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if &record.subject != subject {
                return false;
            }
        }
        if let Some(academic_year) = &self.academic_year {
            if &record.academic_year != academic_year {
                return false;
            }
        }
        if let Some(semester) = &self.semester {
            if &record.semester != semester {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = record.student_name.to_lowercase().contains(&needle)
                || record.subject.to_lowercase().contains(&needle)
                || record.academic_year.to_lowercase().contains(&needle)
                || record.semester.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

fn required_text(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Marks invariant: finite numbers, `total_marks > 0`,
/// `0 <= marks_obtained <= total_marks`. Violations are rejected, never
/// clamped.
fn validate_marks(marks_obtained: f64, total_marks: f64) -> Result<(), DomainError> {
    if !marks_obtained.is_finite() || !total_marks.is_finite() {
        return Err(DomainError::validation("marks must be numeric"));
    }
    if total_marks <= 0.0 {
        return Err(DomainError::validation("total marks must be greater than 0"));
    }
    if marks_obtained < 0.0 || marks_obtained > total_marks {
        return Err(DomainError::validation(format!(
            "marks must be between 0 and {}",
            crate::model::fmt_marks(total_marks)
        )));
    }
    Ok(())
}

fn validate_academic_year(value: &str) -> Result<String, DomainError> {
    let year = required_text("academicYear", value)?;
    let bytes = year.as_bytes();
    let well_formed = bytes.len() == 9
        && bytes[4] == b'-'
        && year[..4].chars().all(|c| c.is_ascii_digit())
        && year[5..].chars().all(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(DomainError::validation(
            "academicYear must look like YYYY-YYYY",
        ));
    }
    Ok(year)
}

fn validate_semester(value: &str) -> Result<String, DomainError> {
    let semester = required_text("semester", value)?;
    match semester.parse::<u32>() {
        Ok(n) if (1..=8).contains(&n) => Ok(semester),
        _ => Err(DomainError::validation("semester must be between 1 and 8")),
    }
}

/// Validates, grades, snapshots the student name, and appends. The grade is
/// derived from the marks at write time and stored on the record.
pub fn add_result(store: &dyn RecordStore, input: &NewResult) -> Result<ResultRecord, DomainError> {
    let subject = required_text("subject", &input.subject)?;
    let academic_year = validate_academic_year(&input.academic_year)?;
    let semester = validate_semester(&input.semester)?;
    validate_marks(input.marks_obtained, input.total_marks)?;

    let student = users::find_student(store, &input.student_id)?;

    let mut records: Vec<ResultRecord> = store::read_records(store, RESULTS)?;
    let id = timestamp_id("result", |id| records.iter().any(|r| r.id == id));
    let grade =
        grading::grade_for_percentage(grading::percentage(input.marks_obtained, input.total_marks));
    let record = ResultRecord {
        id,
        student_id: student.id,
        student_name: student.name,
        subject,
        marks_obtained: input.marks_obtained,
        total_marks: input.total_marks,
        academic_year,
        semester,
        grade,
    };
    records.push(record.clone());
    store::write_records(store, RESULTS, &records)?;
    Ok(record)
}

/// Applies the patch onto the existing record, re-validates the merged
/// values, and recomputes the grade. The student id and name snapshot are
/// not patchable.
pub fn update_result(
    store: &dyn RecordStore,
    result_id: &str,
    patch: &ResultPatch,
) -> Result<ResultRecord, DomainError> {
    let mut records: Vec<ResultRecord> = store::read_records(store, RESULTS)?;
    let Some(index) = records.iter().position(|r| r.id == result_id) else {
        return Err(DomainError::not_found("result not found"));
    };

    let existing = &records[index];
    let subject = match &patch.subject {
        Some(v) => required_text("subject", v)?,
        None => existing.subject.clone(),
    };
    let academic_year = match &patch.academic_year {
        Some(v) => validate_academic_year(v)?,
        None => existing.academic_year.clone(),
    };
    let semester = match &patch.semester {
        Some(v) => validate_semester(v)?,
        None => existing.semester.clone(),
    };
    let marks_obtained = patch.marks_obtained.unwrap_or(existing.marks_obtained);
    let total_marks = patch.total_marks.unwrap_or(existing.total_marks);
    validate_marks(marks_obtained, total_marks)?;

    let record = &mut records[index];
    record.subject = subject;
    record.academic_year = academic_year;
    record.semester = semester;
    record.marks_obtained = marks_obtained;
    record.total_marks = total_marks;
    record.grade = grading::grade_for_percentage(grading::percentage(marks_obtained, total_marks));
    let updated = record.clone();

    store::write_records(store, RESULTS, &records)?;
    Ok(updated)
}

/// Idempotent removal: deleting an id that is already gone is a no-op.
pub fn delete_result(store: &dyn RecordStore, result_id: &str) -> Result<bool, DomainError> {
    let mut records: Vec<ResultRecord> = store::read_records(store, RESULTS)?;
    let before = records.len();
    records.retain(|r| r.id != result_id);
    if records.len() == before {
        return Ok(false);
    }
    store::write_records(store, RESULTS, &records)?;
    Ok(true)
}

/// Insertion order is the stable order; nothing re-sorts stored results.
pub fn list_by_student(
    store: &dyn RecordStore,
    student_id: &str,
) -> Result<Vec<ResultRecord>, DomainError> {
    let records: Vec<ResultRecord> = store::read_records(store, RESULTS)?;
    Ok(records
        .into_iter()
        .filter(|r| r.student_id == student_id)
        .collect())
}

pub fn list_filtered(
    store: &dyn RecordStore,
    filter: &ResultFilter,
) -> Result<Vec<ResultRecord>, DomainError> {
    let records: Vec<ResultRecord> = store::read_records(store, RESULTS)?;
    Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
}

/// Distinct values for filter dropdowns and the subject auto-suggest,
/// first-seen order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultOptions {
    pub subjects: Vec<String>,
    pub academic_years: Vec<String>,
    pub semesters: Vec<String>,
}

pub fn list_options(store: &dyn RecordStore) -> Result<ResultOptions, DomainError> {
    let records: Vec<ResultRecord> = store::read_records(store, RESULTS)?;
    let mut options = ResultOptions {
        subjects: Vec::new(),
        academic_years: Vec::new(),
        semesters: Vec::new(),
    };
    for record in &records {
        if !options.subjects.contains(&record.subject) {
            options.subjects.push(record.subject.clone());
        }
        if !options.academic_years.contains(&record.academic_year) {
            options.academic_years.push(record.academic_year.clone());
        }
        if !options.semesters.contains(&record.semester) {
            options.semesters.push(record.semester.clone());
        }
    }
    Ok(options)
}
