//! Submission and grade statistics
//!
//! A submission is *late* when it arrived strictly after the deadline, and
//! *evaluated* when it carries marks greater than zero. Marks of exactly
//! zero are indistinguishable from "not graded yet"; callers that grade a
//! piece of work with 0 will see it listed as not evaluated.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// One submission joined with its assignment's deadline and max marks
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub marks: Option<f64>,
    pub submitted_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub max_marks: f64,
}

impl SubmissionRecord {
    pub fn is_late(&self) -> bool {
        is_late(self.submitted_at, self.deadline)
    }

    pub fn is_evaluated(&self) -> bool {
        is_evaluated(self.marks)
    }
}

/// Late iff submitted strictly after the deadline; on the deadline is on time.
pub fn is_late(submitted_at: DateTime<Utc>, deadline: DateTime<Utc>) -> bool {
    submitted_at > deadline
}

/// Evaluated iff marks are present and positive.
pub fn is_evaluated(marks: Option<f64>) -> bool {
    matches!(marks, Some(m) if m > 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    Evaluated,
    NotEvaluated,
}

impl EvaluationStatus {
    pub fn of(marks: Option<f64>) -> Self {
        if is_evaluated(marks) {
            EvaluationStatus::Evaluated
        } else {
            EvaluationStatus::NotEvaluated
        }
    }
}

/// Aggregate performance of one student across their submissions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub total_submissions: u32,
    pub on_time: u32,
    pub late: u32,
    pub evaluated: u32,
    pub pending: u32,
    pub marks_awarded: f64,
    /// Sum of max marks over evaluated submissions only
    pub max_marks_graded: f64,
    pub performance_percentage: f64,
    /// Fraction in `0.0..=1.0`
    pub on_time_rate: f64,
}

pub fn summarize(records: &[SubmissionRecord]) -> SubmissionSummary {
    let mut summary = SubmissionSummary {
        total_submissions: 0,
        on_time: 0,
        late: 0,
        evaluated: 0,
        pending: 0,
        marks_awarded: 0.0,
        max_marks_graded: 0.0,
        performance_percentage: 0.0,
        on_time_rate: 0.0,
    };

    for record in records {
        summary.total_submissions += 1;
        if record.is_late() {
            summary.late += 1;
        } else {
            summary.on_time += 1;
        }

        match record.marks {
            Some(marks) if marks > 0.0 => {
                summary.evaluated += 1;
                summary.marks_awarded += marks;
                summary.max_marks_graded += record.max_marks;
            }
            _ => summary.pending += 1,
        }
    }

    if summary.max_marks_graded > 0.0 {
        summary.performance_percentage = summary.marks_awarded / summary.max_marks_graded * 100.0;
    }
    if summary.total_submissions > 0 {
        summary.on_time_rate = f64::from(summary.on_time) / f64::from(summary.total_submissions);
    }

    summary
}

/// Grader-facing statistics for one assignment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    /// Students enrolled in the classroom
    pub student_count: u32,
    pub submission_count: u32,
    pub missing: u32,
    pub evaluated: u32,
    pub pending: u32,
    pub late: u32,
    /// Mean of `marks / max_marks * 100` over evaluated submissions
    pub average_percentage: f64,
}

/// Compute assignment statistics from `(marks, submitted_at)` pairs.
pub fn assignment_stats<I>(
    submissions: I,
    deadline: DateTime<Utc>,
    max_marks: f64,
    student_count: u32,
) -> AssignmentStats
where
    I: IntoIterator<Item = (Option<f64>, DateTime<Utc>)>,
{
    let mut submission_count = 0u32;
    let mut evaluated = 0u32;
    let mut late = 0u32;
    let mut percentage_sum = 0.0;

    for (marks, submitted_at) in submissions {
        submission_count += 1;
        if is_late(submitted_at, deadline) {
            late += 1;
        }
        if let Some(m) = marks.filter(|m| *m > 0.0) {
            evaluated += 1;
            if max_marks > 0.0 {
                percentage_sum += m / max_marks * 100.0;
            }
        }
    }

    AssignmentStats {
        student_count,
        submission_count,
        missing: student_count.saturating_sub(submission_count),
        evaluated,
        pending: submission_count - evaluated,
        late,
        average_percentage: if evaluated > 0 {
            percentage_sum / f64::from(evaluated)
        } else {
            0.0
        },
    }
}

/// Anything that can be ordered on a grader's list
pub trait Gradable {
    fn marks(&self) -> Option<f64>;
    fn roll_no(&self) -> Option<&str>;
}

/// Unevaluated before evaluated; then by roll number, compared as plain
/// strings (so "10" sorts before "9"). A missing roll number compares as
/// the empty string.
pub fn grading_order<T: Gradable>(a: &T, b: &T) -> Ordering {
    let a_done = is_evaluated(a.marks());
    let b_done = is_evaluated(b.marks());
    a_done
        .cmp(&b_done)
        .then_with(|| a.roll_no().unwrap_or("").cmp(b.roll_no().unwrap_or("")))
}

pub fn sort_for_grading<T: Gradable>(items: &mut [T]) {
    items.sort_by(grading_order);
}
