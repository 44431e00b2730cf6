//! Shared HTTP API primitives
//!
//! Pure functions and database helpers only; the server crate wraps them
//! with axum middleware.

pub mod auth;

pub use auth::{
    calculate_signature, initialize_shared_secret, load_shared_secret, validate_signature,
    validate_timestamp, ApiAuthError, SIGNATURE_HEADER, TIMESTAMP_HEADER, USER_HEADER,
};
