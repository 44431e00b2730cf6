//! Database initialization
//!
//! Opens (or creates) the SQLite database, applies connection pragmas and
//! creates every table idempotently. Safe to call on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default number of attendance updates written per transaction
pub const DEFAULT_ATTENDANCE_CHUNK_SIZE: usize = 10;

/// Default per-chunk transaction budget
pub const DEFAULT_ATTENDANCE_CHUNK_TIMEOUT_MS: u64 = 10_000;

/// Default attempts when generating a unique classroom join code
pub const DEFAULT_CLASSROOM_CODE_ATTEMPTS: u32 = 50;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas set on the connect options apply to every pooled connection,
    // not just the one that happens to run a PRAGMA statement.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create every table and index (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_classrooms_table(pool).await?;
    create_memberships_table(pool).await?;
    create_assignments_table(pool).await?;
    create_submissions_table(pool).await?;
    create_attendance_table(pool).await?;
    create_resources_table(pool).await?;
    create_notifications_tables(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Stores runtime configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            role TEXT NOT NULL DEFAULT 'STUDENT' CHECK (role IN ('STUDENT', 'PROFESSOR', 'ADMIN')),
            roll_no TEXT,
            year TEXT,
            division TEXT,
            srn TEXT,
            prn TEXT,
            office_hours TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_classrooms_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classrooms (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            course_name TEXT NOT NULL,
            course_code TEXT NOT NULL,
            year TEXT,
            division TEXT,
            creator_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_memberships_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS memberships (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            classroom_id TEXT NOT NULL REFERENCES classrooms(id) ON DELETE CASCADE,
            joined_at TEXT NOT NULL,
            UNIQUE (user_id, classroom_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_memberships_classroom ON memberships(classroom_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_assignments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assignments (
            id TEXT PRIMARY KEY,
            classroom_id TEXT NOT NULL REFERENCES classrooms(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            requirements TEXT NOT NULL DEFAULT '[]',
            deadline TEXT NOT NULL,
            max_marks REAL NOT NULL CHECK (max_marks > 0),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_assignments_classroom ON assignments(classroom_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            assignment_id TEXT NOT NULL REFERENCES assignments(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            marks REAL,
            submitted_at TEXT NOT NULL,
            UNIQUE (user_id, assignment_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_submissions_assignment ON submissions(assignment_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_attendance_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            classroom_id TEXT NOT NULL REFERENCES classrooms(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            is_present INTEGER NOT NULL,
            UNIQUE (user_id, classroom_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attendance_classroom_date ON attendance(classroom_id, date)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_resources_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resources (
            id TEXT PRIMARY KEY,
            classroom_id TEXT NOT NULL REFERENCES classrooms(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            category TEXT,
            uploader_id TEXT REFERENCES users(id) ON DELETE SET NULL,
            url TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_notifications_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            message TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('ASSIGNMENT', 'ATTENDANCE', 'MEMBERSHIP', 'RESOURCE')),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notification_recipients (
            notification_id TEXT NOT NULL REFERENCES notifications(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            is_read INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (notification_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_notification_recipients_user ON notification_recipients(user_id, is_read)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or repair default settings
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(
        pool,
        "attendance_chunk_size",
        &DEFAULT_ATTENDANCE_CHUNK_SIZE.to_string(),
    )
    .await?;
    ensure_setting(
        pool,
        "attendance_chunk_timeout_ms",
        &DEFAULT_ATTENDANCE_CHUNK_TIMEOUT_MS.to_string(),
    )
    .await?;
    ensure_setting(
        pool,
        "classroom_code_max_attempts",
        &DEFAULT_CLASSROOM_CODE_ATTEMPTS.to_string(),
    )
    .await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// A missing setting is created with the default; a NULL value is reset
/// to the default. Existing non-NULL values are left alone.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value {
        None => {
            // INSERT OR IGNORE: two processes may initialize concurrently
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;
            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}
