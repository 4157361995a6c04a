use crate::grading::{self, Grade};
use crate::model::ResultRecord;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBucket {
    pub grade: Grade,
    pub count: usize,
    pub percentage_of_total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAverage {
    pub student_id: String,
    pub student_name: String,
    pub average_percentage: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAverage {
    pub subject: String,
    pub average_percentage: i64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub period: String,
    pub academic_year: String,
    pub semester: String,
    pub average_percentage: i64,
}

/// Counts stored grades into the six fixed buckets. Every label is always
/// present, zero-filled, and an empty input yields all-zero percentages
/// rather than a division by zero.
pub fn grade_distribution(results: &[ResultRecord]) -> Vec<GradeBucket> {
    let mut counts: HashMap<Grade, usize> = HashMap::new();
    for record in results {
        *counts.entry(record.grade).or_insert(0) += 1;
    }
    let total = results.len();
    Grade::ALL
        .iter()
        .map(|&grade| {
            let count = counts.get(&grade).copied().unwrap_or(0);
            let percentage_of_total = if total > 0 {
                (count as f64 / total as f64 * 100.0).round() as i64
            } else {
                0
            };
            GradeBucket {
                grade,
                count,
                percentage_of_total,
            }
        })
        .collect()
}

struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, percentage: f64) {
        self.sum += percentage;
        self.count += 1;
    }

    fn rounded_mean(&self) -> i64 {
        if self.count == 0 {
            return 0;
        }
        (self.sum / self.count as f64).round() as i64
    }
}

/// Per-student mean of per-result percentages, recomputed from raw marks.
/// Descending by average; ties keep the first-seen group order (stable
/// sort). Callers cap to top-N themselves.
pub fn per_student_average(results: &[ResultRecord]) -> Vec<StudentAverage> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<String, Accumulator> = HashMap::new();
    for record in results {
        let pct = grading::percentage(record.marks_obtained, record.total_marks);
        groups
            .entry(record.student_id.clone())
            .or_insert_with(|| {
                order.push((record.student_id.clone(), record.student_name.clone()));
                Accumulator { sum: 0.0, count: 0 }
            })
            .push(pct);
    }
    let mut averages: Vec<StudentAverage> = order
        .into_iter()
        .map(|(student_id, student_name)| {
            let average_percentage = groups[&student_id].rounded_mean();
            StudentAverage {
                student_id,
                student_name,
                average_percentage,
            }
        })
        .collect();
    averages.sort_by(|a, b| b.average_percentage.cmp(&a.average_percentage));
    averages
}

/// Per-subject mean, first-seen subject order.
pub fn per_subject_average(results: &[ResultRecord]) -> Vec<SubjectAverage> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Accumulator> = HashMap::new();
    for record in results {
        let pct = grading::percentage(record.marks_obtained, record.total_marks);
        groups
            .entry(record.subject.clone())
            .or_insert_with(|| {
                order.push(record.subject.clone());
                Accumulator { sum: 0.0, count: 0 }
            })
            .push(pct);
    }
    order
        .into_iter()
        .map(|subject| {
            let acc = &groups[&subject];
            SubjectAverage {
                average_percentage: acc.rounded_mean(),
                sample_count: acc.count,
                subject,
            }
        })
        .collect()
}

/// Per (academic year, semester) mean, ordered lexicographically by year
/// then numerically by semester. Years in a consistently sortable format
/// such as "2024-2025" therefore come out chronologically.
pub fn time_series_progress(results: &[ResultRecord]) -> Vec<ProgressPoint> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Accumulator> = HashMap::new();
    for record in results {
        let pct = grading::percentage(record.marks_obtained, record.total_marks);
        let key = (record.academic_year.clone(), record.semester.clone());
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Accumulator { sum: 0.0, count: 0 }
            })
            .push(pct);
    }
    order.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| parse_semester(&a.1).cmp(&parse_semester(&b.1)))
    });
    order
        .into_iter()
        .map(|(academic_year, semester)| {
            let average_percentage =
                groups[&(academic_year.clone(), semester.clone())].rounded_mean();
            ProgressPoint {
                period: format!("{} - Sem {}", academic_year, semester),
                academic_year,
                semester,
                average_percentage,
            }
        })
        .collect()
}

fn parse_semester(semester: &str) -> i64 {
    semester.parse::<i64>().unwrap_or(0)
}
