//! Database initialization tests against temporary SQLite files

use classhub_common::db::{
    ensure_setting, get_setting, init_database, set_setting, DEFAULT_ATTENDANCE_CHUNK_SIZE,
    DEFAULT_ATTENDANCE_CHUNK_TIMEOUT_MS,
};
use tempfile::TempDir;

const TABLES: &[&str] = &[
    "settings",
    "users",
    "classrooms",
    "memberships",
    "assignments",
    "submissions",
    "attendance",
    "resources",
    "notifications",
    "notification_recipients",
];

#[tokio::test]
async fn test_init_creates_all_tables() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("classhub.db")).await.unwrap();

    for table in TABLES {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[tokio::test]
async fn test_default_settings_present() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("classhub.db")).await.unwrap();

    let chunk: usize = get_setting(&pool, "attendance_chunk_size", 0).await.unwrap();
    let timeout: u64 = get_setting(&pool, "attendance_chunk_timeout_ms", 0).await.unwrap();
    assert_eq!(chunk, DEFAULT_ATTENDANCE_CHUNK_SIZE);
    assert_eq!(timeout, DEFAULT_ATTENDANCE_CHUNK_TIMEOUT_MS);
}

#[tokio::test]
async fn test_reopen_keeps_changed_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("classhub.db");

    let pool = init_database(&path).await.unwrap();
    set_setting(&pool, "attendance_chunk_size", "25").await.unwrap();
    pool.close().await;

    let pool = init_database(&path).await.unwrap();
    let chunk: usize = get_setting(&pool, "attendance_chunk_size", 0).await.unwrap();
    assert_eq!(chunk, 25);
}

#[tokio::test]
async fn test_ensure_setting_repairs_null() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("classhub.db")).await.unwrap();

    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'classroom_code_max_attempts'")
        .execute(&pool)
        .await
        .unwrap();
    ensure_setting(&pool, "classroom_code_max_attempts", "50").await.unwrap();

    let attempts: u32 = get_setting(&pool, "classroom_code_max_attempts", 0).await.unwrap();
    assert_eq!(attempts, 50);
}

#[tokio::test]
async fn test_unparseable_setting_is_config_error() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("classhub.db")).await.unwrap();

    set_setting(&pool, "attendance_chunk_size", "lots").await.unwrap();
    let result: classhub_common::Result<usize> =
        get_setting(&pool, "attendance_chunk_size", 10).await;
    assert!(matches!(result, Err(classhub_common::Error::Config(_))));
}

#[tokio::test]
async fn test_attendance_key_is_unique() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("classhub.db")).await.unwrap();

    sqlx::query("INSERT INTO users (id, name, role, created_at, updated_at) VALUES ('p', 'Prof', 'PROFESSOR', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO classrooms (id, code, course_name, course_code, creator_id, created_at) VALUES ('c', 'ABC123', 'Networks', 'CS301', 'p', '2024-01-01T00:00:00Z')")
        .execute(&pool)
        .await
        .unwrap();

    let insert = "INSERT INTO attendance (id, user_id, classroom_id, date, is_present) VALUES (?, 'p', 'c', '2024-03-01', 1)";
    sqlx::query(insert).bind("a1").execute(&pool).await.unwrap();
    assert!(sqlx::query(insert).bind("a2").execute(&pool).await.is_err());
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("classhub.db")).await.unwrap();

    let result = sqlx::query("INSERT INTO memberships (id, user_id, classroom_id, joined_at) VALUES ('m', 'ghost', 'nowhere', '2024-01-01T00:00:00Z')")
        .execute(&pool)
        .await;
    assert!(result.is_err());
}
