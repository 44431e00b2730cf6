//! Submission and grading endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use classhub_common::db::{NotificationType, Submission};
use classhub_common::stats::{self, AssignmentStats, EvaluationStatus};
use classhub_common::Role;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::access::{json_body, load_assignment, require_grader, required_text};
use super::auth::{current_user, Identity};
use crate::db::{self, submissions::GraderRow};
use crate::error::{ApiError, ApiResult};
use crate::services::notifier::{graded_message, Notifier};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Opaque reference to the stored work
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    #[serde(flatten)]
    pub submission: Submission,
    pub late: bool,
    pub status: EvaluationStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraderEntry {
    #[serde(flatten)]
    pub row: GraderRow,
    pub late: bool,
    pub status: EvaluationStatus,
}

#[derive(Debug, Serialize)]
pub struct GraderView {
    pub submissions: Vec<GraderEntry>,
    pub stats: AssignmentStats,
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub marks: f64,
}

/// PUT /api/assignments/:id/submission
///
/// Student members only. Resubmitting replaces the content of the single
/// existing submission.
pub async fn submit(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(assignment_id): Path<String>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<Json<SubmissionResponse>> {
    let user = current_user(&state, &identity).await?;
    let (assignment, classroom) = load_assignment(&state.db, &assignment_id).await?;
    let member = db::classrooms::is_member(&state.db, &user.id, &classroom.id).await?;
    if !member || user.role != Role::Student {
        return Err(ApiError::Forbidden(
            "Only student members can submit work".to_string(),
        ));
    }

    let request = json_body(payload)?;
    let content = required_text(&request.content, "content")?;

    let submission = db::submissions::upsert_submission(
        &state.db,
        &user.id,
        &assignment.id,
        &content,
        chrono::Utc::now(),
    )
    .await?;

    let late = stats::is_late(submission.submitted_at, assignment.deadline);
    info!(
        submission_id = %submission.id,
        assignment_id = %assignment.id,
        user_id = %user.id,
        late,
        "Submission saved"
    );

    let status = EvaluationStatus::of(submission.marks);
    Ok(Json(SubmissionResponse {
        submission,
        late,
        status,
    }))
}

/// GET /api/assignments/:id/submissions
///
/// Unevaluated work first, then by roll number as plain text.
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(assignment_id): Path<String>,
) -> ApiResult<Json<GraderView>> {
    let user = current_user(&state, &identity).await?;
    let (assignment, classroom) = load_assignment(&state.db, &assignment_id).await?;
    require_grader(&user, &classroom)?;

    let mut rows = db::submissions::list_for_grading(&state.db, &assignment.id).await?;
    stats::sort_for_grading(&mut rows);

    let students =
        db::classrooms::member_ids_with_role(&state.db, &classroom.id, Role::Student).await?;
    let summary = stats::assignment_stats(
        rows.iter().map(|r| (r.marks, r.submitted_at)),
        assignment.deadline,
        assignment.max_marks,
        u32::try_from(students.len()).unwrap_or(u32::MAX),
    );

    let submissions = rows
        .into_iter()
        .map(|row| GraderEntry {
            late: stats::is_late(row.submitted_at, assignment.deadline),
            status: EvaluationStatus::of(row.marks),
            row,
        })
        .collect();

    Ok(Json(GraderView {
        submissions,
        stats: summary,
    }))
}

/// POST /api/submissions/:id/grade
///
/// Marks and the student's ASSIGNMENT notification commit together.
pub async fn grade_submission(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(submission_id): Path<String>,
    payload: Result<Json<GradeRequest>, JsonRejection>,
) -> ApiResult<Json<SubmissionResponse>> {
    let user = current_user(&state, &identity).await?;
    let submission = db::submissions::get_submission(&state.db, &submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Submission {}", submission_id)))?;
    let (assignment, classroom) = load_assignment(&state.db, &submission.assignment_id).await?;
    require_grader(&user, &classroom)?;

    let request = json_body(payload)?;
    let marks = request.marks;
    if !marks.is_finite() || marks < 0.0 || marks > assignment.max_marks {
        return Err(ApiError::BadRequest(format!(
            "marks must be between 0 and {}",
            assignment.max_marks
        )));
    }

    let mut tx = state.db.begin().await?;
    let graded = db::submissions::set_marks_tx(&mut tx, &submission.id, marks).await?;
    let message = graded_message(
        &assignment.title,
        &classroom.course_name,
        marks,
        assignment.max_marks,
    );
    let created = Notifier::notify_tx(
        &mut tx,
        NotificationType::Assignment,
        &message,
        std::slice::from_ref(&graded.user_id),
    )
    .await?;
    tx.commit().await?;
    state.notifier.publish(std::slice::from_ref(&created));

    info!(
        submission_id = %graded.id,
        grader_id = %user.id,
        marks,
        max_marks = assignment.max_marks,
        "Submission graded"
    );

    let late = stats::is_late(graded.submitted_at, assignment.deadline);
    let status = EvaluationStatus::of(graded.marks);
    Ok(Json(SubmissionResponse {
        submission: graded,
        late,
        status,
    }))
}

pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/api/assignments/:id/submission", put(submit))
        .route("/api/assignments/:id/submissions", get(list_submissions))
        .route("/api/submissions/:id/grade", post(grade_submission))
}
