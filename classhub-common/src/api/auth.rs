//! Request identity verification
//!
//! Authentication itself happens upstream: the gateway in front of the
//! server signs the user id it resolved and forwards three headers:
//!
//! - `x-classhub-user`: user id
//! - `x-classhub-timestamp`: Unix epoch milliseconds
//! - `x-classhub-signature`: SHA-256 hex of `"{user}:{timestamp}:{secret}"`
//!
//! The shared secret lives in the `settings` table under
//! `api_shared_secret`. The special value 0 disables signature checking,
//! leaving only the user header (development and tests).
//!
//! This module contains only pure functions and database operations; the
//! axum middleware wrapping them lives in the server crate.

use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::SqlitePool;

/// Header carrying the authenticated user id
pub const USER_HEADER: &str = "x-classhub-user";
/// Header carrying the signing timestamp (Unix ms)
pub const TIMESTAMP_HEADER: &str = "x-classhub-timestamp";
/// Header carrying the hex signature
pub const SIGNATURE_HEADER: &str = "x-classhub-signature";

/// How old a signed identity may be
pub const MAX_PAST_SKEW_MS: i64 = 300_000;
/// How far in the future a signed identity may claim to be (clock drift)
pub const MAX_FUTURE_SKEW_MS: i64 = 5_000;

/// Authentication error types
#[derive(Debug, Clone)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Signature does not match calculated value
    InvalidSignature { provided: String, calculated: String },

    /// A required identity header is missing or unreadable
    MissingHeader(&'static str),

    /// Database error loading shared secret
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::InvalidTimestamp { reason, .. } => {
                write!(f, "Invalid timestamp: {}", reason)
            }
            ApiAuthError::InvalidSignature { .. } => write!(f, "Invalid signature"),
            ApiAuthError::MissingHeader(name) => write!(f, "Missing header: {}", name),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

/// Load shared secret from database settings, generating one if absent.
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'api_shared_secret'")
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .trim()
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a random non-zero shared secret
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('api_shared_secret', ?)")
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Current time in Unix epoch milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Validate a signing timestamp against the current clock
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    validate_timestamp_at(timestamp, now_millis())
}

/// Validate a signing timestamp against `now` (both Unix ms)
pub fn validate_timestamp_at(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let diff = now - timestamp;

    if diff > MAX_PAST_SKEW_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, MAX_PAST_SKEW_MS),
        });
    }

    if diff < -MAX_FUTURE_SKEW_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_FUTURE_SKEW_MS
            ),
        });
    }

    Ok(())
}

/// SHA-256 of `"{user_id}:{timestamp}:{secret}"` as 64 hex characters
pub fn calculate_signature(user_id: &str, timestamp: i64, shared_secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", user_id, timestamp, shared_secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate a provided signature
pub fn validate_signature(
    provided: &str,
    user_id: &str,
    timestamp: i64,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_signature(user_id, timestamp, shared_secret);

    if !provided.eq_ignore_ascii_case(&calculated) {
        return Err(ApiAuthError::InvalidSignature {
            provided: provided.to_string(),
            calculated,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_730_000_000_000;

    #[test]
    fn test_timestamp_window() {
        assert!(validate_timestamp_at(NOW, NOW).is_ok());
        assert!(validate_timestamp_at(NOW - MAX_PAST_SKEW_MS, NOW).is_ok());
        assert!(validate_timestamp_at(NOW - MAX_PAST_SKEW_MS - 1, NOW).is_err());
        assert!(validate_timestamp_at(NOW + MAX_FUTURE_SKEW_MS, NOW).is_ok());
        assert!(validate_timestamp_at(NOW + MAX_FUTURE_SKEW_MS + 1, NOW).is_err());
    }

    #[test]
    fn test_current_timestamp_is_valid() {
        assert!(validate_timestamp(now_millis()).is_ok());
    }

    #[test]
    fn test_signature_shape_and_determinism() {
        let sig = calculate_signature("user-1", NOW, 123456789);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, calculate_signature("user-1", NOW, 123456789));
        assert_ne!(sig, calculate_signature("user-2", NOW, 123456789));
        assert_ne!(sig, calculate_signature("user-1", NOW + 1, 123456789));
        assert_ne!(sig, calculate_signature("user-1", NOW, 987654321));
    }

    #[test]
    fn test_signature_validation() {
        let secret = 42;
        let sig = calculate_signature("prof", NOW, secret);
        assert!(validate_signature(&sig, "prof", NOW, secret).is_ok());
        assert!(validate_signature(&sig.to_uppercase(), "prof", NOW, secret).is_ok());
        assert!(validate_signature(&sig, "student", NOW, secret).is_err());

        let wrong = "0".repeat(64);
        assert!(matches!(
            validate_signature(&wrong, "prof", NOW, secret),
            Err(ApiAuthError::InvalidSignature { .. })
        ));
    }
}
