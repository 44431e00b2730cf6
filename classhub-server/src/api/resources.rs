//! Shared resource endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use classhub_common::db::{NotificationType, Resource};
use classhub_common::roles::can_manage_classroom;
use serde::Deserialize;
use tracing::info;

use super::access::{is_creator, json_body, load_classroom, require_view, required_text};
use super::auth::{current_user, Identity};
use crate::db::{self, resources::NewResource};
use crate::error::{ApiError, ApiResult};
use crate::services::notifier::{resource_shared_message, Notifier};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ShareResourceRequest {
    pub title: String,
    pub category: Option<String>,
    /// Opaque reference to the stored file
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ResourceQuery {
    pub category: Option<String>,
}

/// POST /api/classrooms/:id/resources
///
/// Any member may share. Every other member gets a RESOURCE notification.
pub async fn share_resource(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
    payload: Result<Json<ShareResourceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Resource>)> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_view(&state.db, &user, &classroom).await?;

    let request = json_body(payload)?;
    let new = NewResource {
        classroom_id: classroom.id.clone(),
        title: required_text(&request.title, "title")?,
        category: request
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        uploader_id: user.id.clone(),
        url: required_text(&request.url, "url")?,
    };

    let recipients: Vec<String> = db::classrooms::member_ids(&state.db, &classroom.id)
        .await?
        .into_iter()
        .filter(|id| *id != user.id)
        .collect();

    let mut tx = state.db.begin().await?;
    let resource = db::resources::insert_resource_tx(&mut tx, &new).await?;
    let mut created = Vec::new();
    if !recipients.is_empty() {
        let message = resource_shared_message(&resource.title, &classroom.course_name);
        created.push(
            Notifier::notify_tx(&mut tx, NotificationType::Resource, &message, &recipients)
                .await?,
        );
    }
    tx.commit().await?;
    state.notifier.publish(&created);

    info!(resource_id = %resource.id, classroom_id = %classroom.id, "Resource shared");
    Ok((StatusCode::CREATED, Json(resource)))
}

/// GET /api/classrooms/:id/resources?category=
pub async fn list_resources(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(classroom_id): Path<String>,
    Query(query): Query<ResourceQuery>,
) -> ApiResult<Json<Vec<Resource>>> {
    let user = current_user(&state, &identity).await?;
    let classroom = load_classroom(&state.db, &classroom_id).await?;
    require_view(&state.db, &user, &classroom).await?;

    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());
    Ok(Json(
        db::resources::list_for_classroom(&state.db, &classroom.id, category).await?,
    ))
}

/// DELETE /api/resources/:id
///
/// The uploader, the classroom creator, or an admin.
pub async fn delete_resource(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(resource_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = current_user(&state, &identity).await?;
    let resource = db::resources::get_resource(&state.db, &resource_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Resource {}", resource_id)))?;
    let classroom = load_classroom(&state.db, &resource.classroom_id).await?;

    let is_uploader = resource.uploader_id.as_deref() == Some(user.id.as_str());
    if !is_uploader && !can_manage_classroom(user.role, is_creator(&user, &classroom)) {
        return Err(ApiError::Forbidden(
            "Only the uploader or a classroom manager can delete this resource".to_string(),
        ));
    }

    db::resources::delete_resource(&state.db, &resource.id).await?;
    info!(resource_id = %resource.id, user_id = %user.id, "Resource deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn resource_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/classrooms/:id/resources",
            get(list_resources).post(share_resource),
        )
        .route("/api/resources/:id", delete(delete_resource))
}
