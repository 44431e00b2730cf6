//! Authentication middleware for classhub-server
//!
//! Resolves the caller's identity from the gateway headers and stores it
//! as an [`Identity`] request extension. With shared secret 0 only the
//! user header is required.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use classhub_common::api::auth::{
    validate_signature, validate_timestamp, ApiAuthError, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    USER_HEADER,
};
use classhub_common::db::User;
use tracing::warn;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl From<ApiAuthError> for ApiError {
    fn from(err: ApiAuthError) -> Self {
        match err {
            ApiAuthError::InvalidSignature {
                provided,
                calculated,
            } => {
                warn!(
                    "Signature validation failed: provided={}, calculated={}",
                    provided, calculated
                );
                ApiError::Unauthorized("Invalid signature".to_string())
            }
            ApiAuthError::DatabaseError(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, ApiAuthError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiAuthError::MissingHeader(name))
}

/// Verify the identity headers against `shared_secret`
pub fn verify_identity(headers: &HeaderMap, shared_secret: i64) -> Result<Identity, ApiAuthError> {
    let user_id = header(headers, USER_HEADER)?;

    // Secret 0 disables signature checking
    if shared_secret != 0 {
        let raw_ts = header(headers, TIMESTAMP_HEADER)?;
        let timestamp: i64 = raw_ts.parse().map_err(|_| ApiAuthError::InvalidTimestamp {
            timestamp: 0,
            now: 0,
            reason: format!("not an integer: {}", raw_ts),
        })?;
        validate_timestamp(timestamp)?;

        let signature = header(headers, SIGNATURE_HEADER)?;
        validate_signature(signature, user_id, timestamp, shared_secret)?;
    }

    Ok(Identity {
        user_id: user_id.to_string(),
    })
}

/// Authentication middleware
///
/// Applied to protected routes only; `/health` does not use it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = verify_identity(request.headers(), state.shared_secret)?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Load the caller's account; an identity without an account is 401
pub async fn current_user(state: &AppState, identity: &Identity) -> ApiResult<User> {
    db::users::get_user(&state.db, &identity.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized(format!(
                "User {} is not registered; create a profile with PUT /api/me",
                identity.user_id
            ))
        })
}
