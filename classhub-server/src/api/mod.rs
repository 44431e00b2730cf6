//! HTTP API handlers for classhub-server

pub mod access;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod classrooms;
pub mod health;
pub mod notifications;
pub mod reports;
pub mod resources;
pub mod submissions;
pub mod users;

pub use assignments::assignment_routes;
pub use attendance::attendance_routes;
pub use auth::{auth_middleware, Identity};
pub use classrooms::classroom_routes;
pub use health::health_routes;
pub use notifications::notification_routes;
pub use reports::report_routes;
pub use resources::resource_routes;
pub use submissions::submission_routes;
pub use users::user_routes;
