//! Classroom and membership endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use classhub_common::db::{get_setting, Classroom, Member, NotificationType, DEFAULT_CLASSROOM_CODE_ATTEMPTS};
use classhub_common::roles::can_create_classroom;
use classhub_common::Role;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::access::{is_creator, json_body, load_classroom, require_manage, require_view, required_text};
use super::auth::{current_user, Identity};
use crate::db::{self, classrooms::NewClassroom, is_unique_violation};
use crate::error::{ApiError, ApiResult};
use crate::services::notifier::{member_joined_message, Notifier};
use crate::AppState;

/// Length of a classroom join code
pub const CLASS_CODE_LENGTH: usize = 6;

const CLASS_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random upper-case alphanumeric join code
pub fn generate_class_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CLASS_CODE_LENGTH)
        .map(|_| CLASS_CODE_CHARSET[rng.gen_range(0..CLASS_CODE_CHARSET.len())] as char)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassroomRequest {
    pub course_name: String,
    pub course_code: String,
    pub year: Option<String>,
    pub division: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinClassroomRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct JoinClassroomResponse {
    pub classroom: Classroom,
    /// False when the caller was already a member
    pub joined: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomDetail {
    #[serde(flatten)]
    pub classroom: Classroom,
    pub member_count: i64,
    pub is_creator: bool,
}

/// POST /api/classrooms
///
/// Retries random join codes until one is free, up to the
/// `classroom_code_max_attempts` setting.
pub async fn create_classroom(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateClassroomRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Classroom>)> {
    let user = current_user(&state, &identity).await?;
    if !can_create_classroom(user.role) {
        return Err(ApiError::Forbidden(
            "Only professors and admins can create classrooms".to_string(),
        ));
    }

    let request = json_body(payload)?;
    let new = NewClassroom {
        course_name: required_text(&request.course_name, "courseName")?,
        course_code: required_text(&request.course_code, "courseCode")?,
        year: request.year,
        division: request.division,
        creator_id: user.id.clone(),
    };

    let max_attempts: u32 = get_setting(
        &state.db,
        "classroom_code_max_attempts",
        DEFAULT_CLASSROOM_CODE_ATTEMPTS,
    )
    .await?;

    for attempt in 1..=max_attempts.max(1) {
        let code = generate_class_code();
        match db::classrooms::insert_classroom(&state.db, &new, &code).await {
            Ok(classroom) => {
                info!(
                    classroom_id = %classroom.id,
                    code = %classroom.code,
                    creator_id = %user.id,
                    "Classroom created"
                );
                return Ok((StatusCode::CREATED, Json(classroom)));
            }
            Err(e) if is_unique_violation(&e) => {
                debug!(attempt, code = %code, "Classroom code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Conflict(format!(
        "Could not find a free classroom code after {} attempts",
        max_attempts
    )))
}

/// GET /api/classrooms
pub async fn list_classrooms(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<Classroom>>> {
    let user = current_user(&state, &identity).await?;
    Ok(Json(db::classrooms::list_for_member(&state.db, &user.id).await?))
}

/// POST /api/classrooms/join
///
/// Joining twice is harmless. A new student member triggers a MEMBERSHIP
/// notification to the classroom creator.
pub async fn join_classroom(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<JoinClassroomRequest>, JsonRejection>,
) -> ApiResult<Json<JoinClassroomResponse>> {
    let user = current_user(&state, &identity).await?;
    let request = json_body(payload)?;
    let code = required_text(&request.code, "code")?.to_ascii_uppercase();

    let classroom = db::classrooms::find_by_code(&state.db, &code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No classroom with code {}", code)))?;

    let mut tx = state.db.begin().await?;
    let joined = db::classrooms::add_member_tx(&mut tx, &user.id, &classroom.id).await?;

    let mut created = Vec::new();
    if joined && user.role == Role::Student && classroom.creator_id != user.id {
        let message = member_joined_message(&user.name, &classroom.course_name);
        created.push(
            Notifier::notify_tx(
                &mut tx,
                NotificationType::Membership,
                &message,
                std::slice::from_ref(&classroom.creator_id),
            )
            .await?,
        );
    }
    tx.commit().await?;
    state.notifier.publish(&created);

    if joined {
        info!(classroom_id = %classroom.id, user_id = %user.id, "Joined classroom");
    }
    Ok(Json(JoinClassroomResponse { classroom, joined }))
}

/// GET /api/classrooms/:id
pub async fn get_classroom(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
) -> ApiResult<Json<ClassroomDetail>> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_view(&state.db, &user, &classroom).await?;

    let member_count = db::classrooms::member_count(&state.db, &classroom.id).await?;
    let is_creator = is_creator(&user, &classroom);
    Ok(Json(ClassroomDetail {
        classroom,
        member_count,
        is_creator,
    }))
}

/// DELETE /api/classrooms/:id
pub async fn delete_classroom(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_manage(&user, &classroom)?;

    db::classrooms::delete_classroom(&state.db, &classroom.id).await?;
    info!(classroom_id = %classroom.id, user_id = %user.id, "Classroom deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/classrooms/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
) -> ApiResult<Json<Vec<Member>>> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_view(&state.db, &user, &classroom).await?;

    Ok(Json(db::classrooms::list_members(&state.db, &classroom.id).await?))
}

/// DELETE /api/classrooms/:id/membership
///
/// Leaves the classroom; attendance history stays. The creator cannot leave.
pub async fn leave_classroom(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    if is_creator(&user, &classroom) {
        return Err(ApiError::Conflict(
            "The creator cannot leave their own classroom".to_string(),
        ));
    }

    if !db::classrooms::remove_member(&state.db, &user.id, &classroom.id).await? {
        return Err(ApiError::NotFound(format!(
            "Not a member of classroom {}",
            classroom.id
        )));
    }

    info!(classroom_id = %classroom.id, user_id = %user.id, "Left classroom");
    Ok(StatusCode::NO_CONTENT)
}

pub fn classroom_routes() -> Router<AppState> {
    Router::new()
        .route("/api/classrooms", post(create_classroom).get(list_classrooms))
        .route("/api/classrooms/join", post(join_classroom))
        .route(
            "/api/classrooms/:id",
            get(get_classroom).delete(delete_classroom),
        )
        .route("/api/classrooms/:id/members", get(list_members))
        .route("/api/classrooms/:id/membership", delete(leave_classroom))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_code_shape() {
        for _ in 0..100 {
            let code = generate_class_code();
            assert_eq!(code.len(), CLASS_CODE_LENGTH);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}
