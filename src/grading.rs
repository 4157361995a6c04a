use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grades in descending order of achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Grade; 6] = [
        Grade::APlus,
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold table, inclusive lower bounds, highest first.
pub fn grade_for_percentage(percentage: f64) -> Grade {
    if percentage >= 90.0 {
        Grade::APlus
    } else if percentage >= 80.0 {
        Grade::A
    } else if percentage >= 70.0 {
        Grade::B
    } else if percentage >= 60.0 {
        Grade::C
    } else if percentage >= 50.0 {
        Grade::D
    } else {
        Grade::F
    }
}

/// Percentage of `total_marks` achieved. A non-positive total yields 0
/// rather than NaN; stored records never hit that branch because the
/// repository rejects `total_marks <= 0` up front.
pub fn percentage(marks_obtained: f64, total_marks: f64) -> f64 {
    if total_marks > 0.0 {
        marks_obtained / total_marks * 100.0
    } else {
        0.0
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
