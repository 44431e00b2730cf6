//! Lookup-and-authorize helpers shared by the handlers
//!
//! Each helper answers 404 for a missing entity before any permission
//! check, and 403 when the caller's role or ownership does not allow the
//! action.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use classhub_common::db::{Assignment, Classroom, User};
use classhub_common::roles::{can_grade, can_manage_classroom, can_view_classroom};
use sqlx::SqlitePool;

use crate::db;
use crate::error::{ApiError, ApiResult};

/// Unwrap a JSON body, reporting malformed input as 400
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Trimmed, non-empty text field
pub fn required_text(value: &str, field: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

pub fn is_creator(user: &User, classroom: &Classroom) -> bool {
    user.id == classroom.creator_id
}

pub async fn load_classroom(pool: &SqlitePool, classroom_id: &str) -> ApiResult<Classroom> {
    db::classrooms::get_classroom(pool, classroom_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Classroom {}", classroom_id)))
}

/// Load an assignment together with its classroom
pub async fn load_assignment(
    pool: &SqlitePool,
    assignment_id: &str,
) -> ApiResult<(Assignment, Classroom)> {
    let assignment = db::assignments::get_assignment(pool, assignment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Assignment {}", assignment_id)))?;
    let classroom = load_classroom(pool, &assignment.classroom_id).await?;
    Ok((assignment, classroom))
}

/// Members (and admins) may read classroom content
pub async fn require_view(pool: &SqlitePool, user: &User, classroom: &Classroom) -> ApiResult<()> {
    let member = db::classrooms::is_member(pool, &user.id, &classroom.id).await?;
    if can_view_classroom(user.role, member) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Not a member of classroom {}",
            classroom.id
        )))
    }
}

pub fn require_manage(user: &User, classroom: &Classroom) -> ApiResult<()> {
    if can_manage_classroom(user.role, is_creator(user, classroom)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Only the classroom creator or an admin can manage classroom {}",
            classroom.id
        )))
    }
}

pub fn require_grader(user: &User, classroom: &Classroom) -> ApiResult<()> {
    if can_grade(user.role, is_creator(user, classroom)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only the classroom's professor or an admin can grade".to_string(),
        ))
    }
}
