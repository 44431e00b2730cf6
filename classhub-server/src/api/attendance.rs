//! Attendance endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use classhub_common::roles::can_manage_classroom;
use classhub_common::time::parse_calendar_date;
use serde::Deserialize;

use super::access::{is_creator, json_body, load_classroom, require_manage, require_view};
use super::auth::{current_user, Identity};
use crate::db::{self, attendance::AttendanceMark};
use crate::error::{ApiError, ApiResult};
use crate::services::attendance_batch::{
    validate, BatchAttendanceRequest, BatchAttendanceWriter, BatchOutcome,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub date: Option<String>,
}

/// POST /api/classrooms/:id/attendance/batch
///
/// 404 for an unknown classroom and 400 for a bad body or a userId that
/// is not a member, all before any write. A failing chunk answers 500; chunks before it stay committed.
pub async fn batch_update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
    payload: Result<Json<BatchAttendanceRequest>, JsonRejection>,
) -> ApiResult<Json<BatchOutcome>> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_manage(&user, &classroom)?;

    let batch = validate(json_body(payload)?)?;

    let writer = BatchAttendanceWriter::from_settings(state.db.clone(), state.notifier.clone()).await?;
    let outcome = writer.write(&classroom, &batch).await?;
    Ok(Json(outcome))
}

/// GET /api/classrooms/:id/attendance?date=YYYY-MM-DD
///
/// Managers see every row for the date; other members see their own.
pub async fn read_attendance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
    Query(query): Query<AttendanceQuery>,
) -> ApiResult<Json<Vec<AttendanceMark>>> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_view(&state.db, &user, &classroom).await?;

    let raw_date = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing date".to_string()))?;
    let date = parse_calendar_date(&raw_date)?;

    let mut marks = db::attendance::list_for_date(&state.db, &classroom.id, date).await?;
    if !can_manage_classroom(user.role, is_creator(&user, &classroom)) {
        marks.retain(|m| m.user_id == user.id);
    }
    Ok(Json(marks))
}

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/api/classrooms/:id/attendance/batch", post(batch_update))
        .route("/api/classrooms/:id/attendance", get(read_attendance))
}
