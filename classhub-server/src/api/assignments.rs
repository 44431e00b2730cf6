//! Assignment endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use classhub_common::db::{Assignment, NotificationType, Submission};
use classhub_common::Role;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::access::{json_body, load_assignment, load_classroom, require_manage, require_view, required_text};
use super::auth::{current_user, Identity};
use crate::db::{self, assignments::NewAssignment};
use crate::error::{ApiError, ApiResult};
use crate::services::notifier::{assignment_posted_message, Notifier};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub max_marks: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,
    /// The caller's own submission, if any
    pub my_submission: Option<Submission>,
}

/// POST /api/classrooms/:id/assignments
///
/// Creates the assignment and one ASSIGNMENT notification addressed to
/// every student member, in one transaction.
pub async fn create_assignment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
    payload: Result<Json<CreateAssignmentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Assignment>)> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_manage(&user, &classroom)?;

    let request = json_body(payload)?;
    if !request.max_marks.is_finite() || request.max_marks <= 0.0 {
        return Err(ApiError::BadRequest("maxMarks must be greater than 0".to_string()));
    }
    let new = NewAssignment {
        classroom_id: classroom.id.clone(),
        title: required_text(&request.title, "title")?,
        description: request.description,
        requirements: request
            .requirements
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect(),
        deadline: request.deadline,
        max_marks: request.max_marks,
    };

    let students =
        db::classrooms::member_ids_with_role(&state.db, &classroom.id, Role::Student).await?;

    let mut tx = state.db.begin().await?;
    let assignment = db::assignments::insert_assignment_tx(&mut tx, &new).await?;
    let mut created = Vec::new();
    if !students.is_empty() {
        let message = assignment_posted_message(
            &assignment.title,
            &classroom.course_name,
            assignment.deadline,
        );
        created.push(
            Notifier::notify_tx(&mut tx, NotificationType::Assignment, &message, &students)
                .await?,
        );
    }
    tx.commit().await?;
    state.notifier.publish(&created);

    info!(
        assignment_id = %assignment.id,
        classroom_id = %classroom.id,
        recipients = students.len(),
        "Assignment created"
    );
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// GET /api/classrooms/:id/assignments
pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
) -> ApiResult<Json<Vec<Assignment>>> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_view(&state.db, &user, &classroom).await?;

    Ok(Json(
        db::assignments::list_for_classroom(&state.db, &classroom.id).await?,
    ))
}

/// GET /api/assignments/:id
pub async fn get_assignment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(assignment_id): Path<String>,
) -> ApiResult<Json<AssignmentDetail>> {
    let user = current_user(&state, &identity).await?;
    let (assignment, classroom) = load_assignment(&state.db, &assignment_id).await?;
    require_view(&state.db, &user, &classroom).await?;

    let my_submission = db::submissions::get_for_user(&state.db, &user.id, &assignment.id).await?;
    Ok(Json(AssignmentDetail {
        assignment,
        my_submission,
    }))
}

/// DELETE /api/assignments/:id
pub async fn delete_assignment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(assignment_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = current_user(&state, &identity).await?;
    let (assignment, classroom) = load_assignment(&state.db, &assignment_id).await?;
    require_manage(&user, &classroom)?;

    db::assignments::delete_assignment(&state.db, &assignment.id).await?;
    info!(assignment_id = %assignment.id, user_id = %user.id, "Assignment deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/classrooms/:id/assignments",
            get(list_assignments).post(create_assignment),
        )
        .route(
            "/api/assignments/:id",
            get(get_assignment).delete(delete_assignment),
        )
}
