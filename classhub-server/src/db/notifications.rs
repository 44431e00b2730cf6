//! Notification queries
//!
//! A notification row is shared by all its recipients; read state is kept
//! per recipient in `notification_recipients`.

use chrono::{DateTime, Utc};
use classhub_common::db::{Notification, NotificationType};
use classhub_common::Result;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::new_id;

/// A notification as written, with its addressees
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub recipients: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert one notification addressed to `recipients`, unread for each
pub async fn insert_notification_tx(
    tx: &mut Transaction<'_, Sqlite>,
    kind: NotificationType,
    message: &str,
    recipients: &[String],
) -> std::result::Result<CreatedNotification, sqlx::Error> {
    let id = new_id();
    let created_at = Utc::now();

    sqlx::query("INSERT INTO notifications (id, message, type, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(message)
        .bind(kind)
        .bind(created_at)
        .execute(&mut **tx)
        .await?;

    for user_id in recipients {
        sqlx::query(
            r#"
            INSERT INTO notification_recipients (notification_id, user_id, is_read)
            VALUES (?, ?, 0)
            ON CONFLICT(notification_id, user_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(CreatedNotification {
        id,
        kind,
        message: message.to_string(),
        recipients: recipients.to_vec(),
        created_at,
    })
}

/// A user's notifications, newest first
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    unread_only: bool,
) -> Result<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT n.id, n.message, n.type, r.is_read, n.created_at
        FROM notifications n
        JOIN notification_recipients r ON r.notification_id = n.id
        WHERE r.user_id = ? AND (? = 0 OR r.is_read = 0)
        ORDER BY n.created_at DESC, n.id
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

/// Mark one notification read for `user_id`.
///
/// Returns false when the notification is not addressed to the user.
/// Marking an already-read notification is a no-op that still returns true.
pub async fn mark_read(pool: &SqlitePool, notification_id: &str, user_id: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE notification_recipients SET is_read = 1 WHERE notification_id = ? AND user_id = ?",
    )
    .bind(notification_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark all of the user's unread notifications read; returns how many changed
pub async fn mark_all_read(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE notification_recipients SET is_read = 1 WHERE user_id = ? AND is_read = 0",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn unread_count(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notification_recipients WHERE user_id = ? AND is_read = 0",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
