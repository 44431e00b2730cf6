//! Notification endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use classhub_common::db::Notification;
use classhub_common::sse::user_event_stream;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::auth::{current_user, Identity};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /api/notifications?unread=true
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<NotificationList>> {
    let user = current_user(&state, &identity).await?;
    let notifications = db::notifications::list_for_user(&state.db, &user.id, query.unread).await?;
    let unread_count = db::notifications::unread_count(&state.db, &user.id).await?;

    Ok(Json(NotificationList {
        notifications,
        unread_count,
    }))
}

/// POST /api/notifications/:id/read
///
/// Idempotent; 404 only when the notification is not addressed to the caller.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(notification_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = current_user(&state, &identity).await?;
    if !db::notifications::mark_read(&state.db, &notification_id, &user.id).await? {
        return Err(ApiError::NotFound(format!("Notification {}", notification_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<MarkAllReadResponse>> {
    let user = current_user(&state, &identity).await?;
    let updated = db::notifications::mark_all_read(&state.db, &user.id).await?;
    debug!(user_id = %user.id, updated, "Marked all notifications read");
    Ok(Json(MarkAllReadResponse { updated }))
}

/// GET /api/notifications/events
///
/// SSE stream of notifications created for the caller after connecting.
pub async fn notification_events(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let user = current_user(&state, &identity).await?;
    Ok(user_event_stream(state.events.subscribe(), user.id))
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/events", get(notification_events))
        .route("/api/notifications/:id/read", post(mark_read))
}
