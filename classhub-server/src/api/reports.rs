//! Student report endpoint

use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use classhub_common::db::User;
use classhub_common::roles::can_view_student_report;
use classhub_common::stats::{self, AttendanceSummary, SubmissionSummary};
use classhub_common::Role;
use serde::Serialize;

use super::auth::{current_user, Identity};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Attendance and submission performance for one student
#[derive(Debug, Serialize)]
pub struct StudentReport {
    pub user: User,
    pub attendance: AttendanceSummary,
    pub submissions: SubmissionSummary,
}

/// Build a report from the full record set; nothing is cached
pub async fn build_report(state: &AppState, user: User) -> ApiResult<StudentReport> {
    let entries = db::attendance::entries_for_user(&state.db, &user.id).await?;
    let labels = db::classrooms::course_labels_for_member(&state.db, &user.id).await?;
    let records = db::submissions::records_for_user(&state.db, &user.id).await?;

    Ok(StudentReport {
        attendance: stats::attendance::summarize(&entries, &labels),
        submissions: stats::submissions::summarize(&records),
        user,
    })
}

/// GET /api/students/:user_id/report
///
/// Visible to the student, to professors running one of the student's
/// classrooms, and to admins.
pub async fn student_report(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<StudentReport>> {
    let caller = current_user(&state, &identity).await?;
    let student = db::users::get_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", user_id)))?;

    let is_self = caller.id == student.id;
    let teaches_user = caller.role == Role::Professor
        && !is_self
        && db::classrooms::created_classroom_has_member(&state.db, &caller.id, &student.id)
            .await?;
    if !can_view_student_report(caller.role, is_self, teaches_user) {
        return Err(ApiError::Forbidden(format!(
            "Not allowed to view the report of {}",
            student.id
        )));
    }

    Ok(Json(build_report(&state, student).await?))
}

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/api/students/:user_id/report", get(student_report))
}
