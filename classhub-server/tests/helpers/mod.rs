//! Shared helpers for classhub-server integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use classhub_common::api::auth::USER_HEADER;
use classhub_common::db::init_database;
use classhub_server::services::LogMailer;
use classhub_server::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

/// A router over a fresh database in a temporary directory
pub struct TestApp {
    /// Kept alive so the database file outlives the test
    pub dir: TempDir,
    pub db: SqlitePool,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    /// Auth checking disabled (shared secret 0)
    pub async fn new() -> Self {
        Self::with_secret(0).await
    }

    pub async fn with_secret(shared_secret: i64) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let db = init_database(&dir.path().join("classhub.db"))
            .await
            .expect("database");
        let state = AppState::new(db.clone(), shared_secret, Arc::new(LogMailer));
        let router = build_router(state.clone());
        Self {
            dir,
            db,
            state,
            router,
        }
    }

    /// Send a request as `user` (None for no identity header)
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = build_request(method, uri, user, body);
        send(&self.router, request).await
    }
}

pub fn build_request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Run one request; an empty body comes back as `Value::Null`
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

/// Insert a user directly
pub async fn seed_user(db: &SqlitePool, id: &str, name: &str, role: &str, roll_no: Option<&str>) {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO users (id, name, email, role, roll_no, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(format!("{}@example.edu", id))
    .bind(role)
    .bind(roll_no)
    .bind(now)
    .bind(now)
    .execute(db)
    .await
    .unwrap();
}

/// Insert a classroom created by `creator_id` and enroll the creator plus `members`
pub async fn seed_classroom(db: &SqlitePool, id: &str, creator_id: &str, members: &[&str]) {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO classrooms (id, code, course_name, course_code, creator_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(format!("CODE-{}", id.to_uppercase()))
    .bind("Computer Networks")
    .bind("CS301")
    .bind(creator_id)
    .bind(now)
    .execute(db)
    .await
    .unwrap();

    for user_id in std::iter::once(&creator_id).chain(members.iter()) {
        sqlx::query("INSERT INTO memberships (id, user_id, classroom_id, joined_at) VALUES (?, ?, ?, ?)")
            .bind(format!("m-{}-{}", id, user_id))
            .bind(*user_id)
            .bind(id)
            .bind(now)
            .execute(db)
            .await
            .unwrap();
    }
}

/// Professor `prof` owning classroom `class-1` with students `s01..=sNN`
pub async fn seed_roster(db: &SqlitePool, students: usize) -> Vec<String> {
    seed_user(db, "prof", "Prof. Rao", "PROFESSOR", None).await;
    let ids: Vec<String> = (1..=students).map(|i| format!("s{:02}", i)).collect();
    for id in &ids {
        seed_user(db, id, &format!("Student {}", id), "STUDENT", Some(id)).await;
    }
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    seed_classroom(db, "class-1", "prof", &refs).await;
    ids
}

pub async fn count(db: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(db).await.unwrap()
}
