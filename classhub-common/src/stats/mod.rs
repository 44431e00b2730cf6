//! Read-side statistics derived from attendance and submission rows
//!
//! Pure functions only; callers load the rows and pass them in.

pub mod attendance;
pub mod submissions;

pub use attendance::{AttendanceEntry, AttendanceFigures, AttendanceSummary, AttendanceTally, CourseLabel, Standing};
pub use submissions::{
    assignment_stats, grading_order, is_evaluated, is_late, sort_for_grading, AssignmentStats,
    EvaluationStatus, Gradable, SubmissionRecord, SubmissionSummary,
};
