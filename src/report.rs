use crate::grading::{self, Grade};
use crate::model::{fmt_marks, ResultRecord};
use serde::Serialize;
use std::collections::HashMap;

pub const REPORT_TITLE: &str = "Academic Result Report";
pub const APP_TITLE: &str = "Result Hub";
pub const REPORT_FOOTER: &str = "Result Hub - Official Result Document";

// Body lines per rendered page before the footer is appended.
const PAGE_BODY_LINES: usize = 48;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub subject: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportGroup {
    pub period: String,
    pub rows: Vec<ReportRow>,
    pub total_obtained: f64,
    pub total_possible: f64,
    pub percentage: f64,
    pub overall_grade: Grade,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultReport {
    pub student_name: String,
    pub roll_number: String,
    pub file_name: String,
    pub groups: Vec<ReportGroup>,
}

/// `<student name with whitespace runs collapsed to "_">_Result_Report.txt`.
/// Deterministic for a given name.
pub fn report_file_name(student_name: &str) -> String {
    let mut base = String::with_capacity(student_name.len());
    let mut in_whitespace = false;
    for ch in student_name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                base.push('_');
                in_whitespace = true;
            }
        } else {
            base.push(ch);
            in_whitespace = false;
        }
    }
    format!("{}_Result_Report.txt", base)
}

/// Groups results by `"{academicYear} - Semester {semester}"` in first-seen
/// order. Each group's percentage and overall grade are re-derived from the
/// summed raw marks, not copied from any stored grade.
pub fn build_result_report(
    results: &[ResultRecord],
    student_name: &str,
    roll_number: &str,
) -> ResultReport {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<&ResultRecord>> = HashMap::new();
    for record in results {
        let period = format!("{} - Semester {}", record.academic_year, record.semester);
        grouped
            .entry(period.clone())
            .or_insert_with(|| {
                order.push(period);
                Vec::new()
            })
            .push(record);
    }

    let groups = order
        .into_iter()
        .map(|period| {
            let members = &grouped[&period];
            let total_obtained: f64 = members.iter().map(|r| r.marks_obtained).sum();
            let total_possible: f64 = members.iter().map(|r| r.total_marks).sum();
            let percentage = grading::round2(grading::percentage(total_obtained, total_possible));
            let overall_grade = grading::grade_for_percentage(percentage);
            let rows = members
                .iter()
                .map(|r| ReportRow {
                    subject: r.subject.clone(),
                    marks_obtained: r.marks_obtained,
                    total_marks: r.total_marks,
                    grade: r.grade,
                })
                .collect();
            ReportGroup {
                period,
                rows,
                total_obtained,
                total_possible,
                percentage,
                overall_grade,
            }
        })
        .collect();

    ResultReport {
        student_name: student_name.to_string(),
        roll_number: roll_number.to_string(),
        file_name: report_file_name(student_name),
        groups,
    }
}

fn group_lines(group: &ReportGroup) -> Vec<String> {
    const HEADERS: [&str; 4] = ["Subject", "Marks Obtained", "Total Marks", "Grade"];

    let mut widths: [usize; 4] = HEADERS.map(str::len);
    let cells: Vec<[String; 4]> = group
        .rows
        .iter()
        .map(|row| {
            [
                row.subject.clone(),
                fmt_marks(row.marks_obtained),
                fmt_marks(row.total_marks),
                row.grade.to_string(),
            ]
        })
        .collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let format_row = |cols: [&str; 4]| {
        cols.iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::new();
    lines.push(group.period.clone());
    lines.push(format_row([HEADERS[0], HEADERS[1], HEADERS[2], HEADERS[3]]));
    lines.push("-".repeat(widths.iter().sum::<usize>() + 6));
    for row in &cells {
        lines.push(format_row([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
        ]));
    }
    lines.push(format!(
        "Total Marks: {}/{}   Percentage: {:.2}%   Overall Grade: {}",
        fmt_marks(group.total_obtained),
        fmt_marks(group.total_possible),
        group.percentage,
        group.overall_grade
    ));
    lines.push(String::new());
    lines
}

/// Renders the report as paginated plain text. Pages are separated by a form
/// feed; every page carries the document footer and its `Page i of n` index.
pub fn render_report(report: &ResultReport, generated_on: &str) -> (String, usize) {
    let mut body: Vec<String> = vec![
        REPORT_TITLE.to_string(),
        APP_TITLE.to_string(),
        "=".repeat(REPORT_FOOTER.len()),
        format!("Student Name: {}", report.student_name),
        format!("Roll Number: {}", report.roll_number),
        format!("Date: {}", generated_on),
        String::new(),
    ];
    for group in &report.groups {
        body.extend(group_lines(group));
    }
    // Drop the trailing blank so a report never ends on an empty page.
    while body.last().is_some_and(|l| l.is_empty()) {
        body.pop();
    }

    let pages: Vec<&[String]> = body.chunks(PAGE_BODY_LINES).collect();
    let page_count = pages.len().max(1);
    let rendered = pages
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut page = chunk.join("\n");
            page.push_str(&format!(
                "\n\n{}\nPage {} of {}\n",
                REPORT_FOOTER,
                i + 1,
                page_count
            ));
            page
        })
        .collect::<Vec<_>>()
        .join("\u{c}");
    (rendered, page_count)
}
