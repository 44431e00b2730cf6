//! Profile and account administration endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use classhub_common::db::User;
use classhub_common::roles::can_administer_users;
use tracing::info;

use super::access::{json_body, required_text};
use super::auth::{current_user, Identity};
use crate::db::users::{self, AdminUserUpdate, ProfileUpdate};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<User>> {
    Ok(Json(current_user(&state, &identity).await?))
}

/// PUT /api/me
///
/// First call creates the account (as STUDENT, or PROFESSOR when asked);
/// later calls update profile fields. The role never changes here.
pub async fn put_me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let mut profile = json_body(payload)?;
    profile.name = required_text(&profile.name, "name")?;

    let user = users::upsert_profile(&state.db, &identity.user_id, &profile).await?;
    info!(user_id = %user.id, role = %user.role, "Profile saved");
    Ok(Json(user))
}

async fn require_admin(state: &AppState, identity: &Identity) -> ApiResult<User> {
    let user = current_user(state, identity).await?;
    if !can_administer_users(user.role) {
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }
    Ok(user)
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<User>>> {
    require_admin(&state, &identity).await?;
    Ok(Json(users::list_users(&state.db).await?))
}

/// PATCH /api/users/:user_id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
    payload: Result<Json<AdminUserUpdate>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let admin = require_admin(&state, &identity).await?;
    let update = json_body(payload)?;
    if let Some(name) = &update.name {
        required_text(name, "name")?;
    }

    let user = users::update_user(&state.db, &user_id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", user_id)))?;

    info!(admin_id = %admin.id, user_id = %user.id, role = %user.role, "User updated by admin");
    Ok(Json(user))
}

/// DELETE /api/users/:user_id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    let admin = require_admin(&state, &identity).await?;
    if admin.id == user_id {
        return Err(ApiError::Conflict("Admins cannot delete their own account".to_string()));
    }

    if !users::delete_user(&state.db, &user_id).await? {
        return Err(ApiError::NotFound(format!("User {}", user_id)));
    }

    info!(admin_id = %admin.id, user_id = %user_id, "User deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(get_me).put(put_me))
        .route("/api/users", get(list_users))
        .route("/api/users/:user_id", patch(update_user).delete(delete_user))
}
