//! Submission and grading queries

use chrono::{DateTime, Utc};
use classhub_common::db::Submission;
use classhub_common::stats::{Gradable, SubmissionRecord};
use classhub_common::Result;
use serde::Serialize;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use super::new_id;

const SUBMISSION_COLUMNS: &str = "id, user_id, assignment_id, content, marks, submitted_at";

/// Submission joined with the submitting student, as shown to graders
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GraderRow {
    pub id: String,
    pub user_id: String,
    pub student_name: String,
    pub roll_no: Option<String>,
    pub content: String,
    pub marks: Option<f64>,
    pub submitted_at: DateTime<Utc>,
}

impl Gradable for GraderRow {
    fn marks(&self) -> Option<f64> {
        self.marks
    }

    fn roll_no(&self) -> Option<&str> {
        self.roll_no.as_deref()
    }
}

/// Submit or resubmit.
///
/// One row per (user, assignment): a resubmission replaces `content` and
/// `submitted_at` on the existing row and keeps its id and marks.
pub async fn upsert_submission(
    pool: &SqlitePool,
    user_id: &str,
    assignment_id: &str,
    content: &str,
    submitted_at: DateTime<Utc>,
) -> Result<Submission> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        r#"
        INSERT INTO submissions (id, user_id, assignment_id, content, marks, submitted_at)
        VALUES (?, ?, ?, ?, NULL, ?)
        ON CONFLICT(user_id, assignment_id) DO UPDATE SET
            content = excluded.content,
            submitted_at = excluded.submitted_at
        RETURNING {}
        "#,
        SUBMISSION_COLUMNS
    ))
    .bind(new_id())
    .bind(user_id)
    .bind(assignment_id)
    .bind(content)
    .bind(submitted_at)
    .fetch_one(pool)
    .await?;

    Ok(submission)
}

pub async fn get_submission(pool: &SqlitePool, submission_id: &str) -> Result<Option<Submission>> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {} FROM submissions WHERE id = ?",
        SUBMISSION_COLUMNS
    ))
    .bind(submission_id)
    .fetch_optional(pool)
    .await?;

    Ok(submission)
}

pub async fn get_for_user(
    pool: &SqlitePool,
    user_id: &str,
    assignment_id: &str,
) -> Result<Option<Submission>> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {} FROM submissions WHERE user_id = ? AND assignment_id = ?",
        SUBMISSION_COLUMNS
    ))
    .bind(user_id)
    .bind(assignment_id)
    .fetch_optional(pool)
    .await?;

    Ok(submission)
}

/// Every submission of an assignment with student details (unsorted)
pub async fn list_for_grading(pool: &SqlitePool, assignment_id: &str) -> Result<Vec<GraderRow>> {
    let rows = sqlx::query_as::<_, GraderRow>(
        r#"
        SELECT s.id, s.user_id, u.name AS student_name, u.roll_no, s.content, s.marks, s.submitted_at
        FROM submissions s
        JOIN users u ON u.id = s.user_id
        WHERE s.assignment_id = ?
        "#,
    )
    .bind(assignment_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Set marks inside the caller's transaction
pub async fn set_marks_tx(
    tx: &mut Transaction<'_, Sqlite>,
    submission_id: &str,
    marks: f64,
) -> Result<Submission> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "UPDATE submissions SET marks = ? WHERE id = ? RETURNING {}",
        SUBMISSION_COLUMNS
    ))
    .bind(marks)
    .bind(submission_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(submission)
}

/// A user's submissions joined with deadline and max marks
pub async fn records_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<SubmissionRecord>> {
    let rows: Vec<(Option<f64>, DateTime<Utc>, DateTime<Utc>, f64)> = sqlx::query_as(
        r#"
        SELECT s.marks, s.submitted_at, a.deadline, a.max_marks
        FROM submissions s
        JOIN assignments a ON a.id = s.assignment_id
        WHERE s.user_id = ?
        ORDER BY s.submitted_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(marks, submitted_at, deadline, max_marks)| SubmissionRecord {
            marks,
            submitted_at,
            deadline,
            max_marks,
        })
        .collect())
}
