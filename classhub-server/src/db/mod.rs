//! Database queries for classhub-server
//!
//! Functions taking a `SqlitePool` run as standalone statements; functions
//! taking a `Transaction` join the caller's unit of work.

pub mod assignments;
pub mod attendance;
pub mod classrooms;
pub mod notifications;
pub mod resources;
pub mod submissions;
pub mod users;

/// True when the error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// New opaque row id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
