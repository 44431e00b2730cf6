//! classhub-server library
//!
//! JSON API for classrooms, assignments, submissions, attendance,
//! resources and notifications.

use axum::Router;
use chrono::{DateTime, Utc};
use classhub_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

use services::{Mailer, Notifier};

/// Events buffered per SSE subscriber before it starts lagging
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Committed notifications, for SSE subscribers
    pub events: EventBus,
    /// Post-commit notification delivery
    pub notifier: Notifier,
    /// Shared secret for identity signatures (0 disables checking)
    pub shared_secret: i64,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, shared_secret: i64, mailer: Arc<dyn Mailer>) -> Self {
        let events = EventBus::new(EVENT_BUS_CAPACITY);
        let notifier = Notifier::new(db.clone(), events.clone(), mailer);
        Self {
            db,
            events,
            notifier,
            shared_secret,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `/health` is public; everything under `/api` goes through the
/// authentication middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    // Protected routes (require authentication)
    let protected = Router::new()
        .merge(api::user_routes())
        .merge(api::classroom_routes())
        .merge(api::assignment_routes())
        .merge(api::submission_routes())
        .merge(api::attendance_routes())
        .merge(api::resource_routes())
        .merge(api::notification_routes())
        .merge(api::report_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
