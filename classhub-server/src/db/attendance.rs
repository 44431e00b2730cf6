//! Attendance queries

use chrono::NaiveDate;
use classhub_common::db::Attendance;
use classhub_common::stats::AttendanceEntry;
use classhub_common::Result;
use serde::Serialize;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use super::new_id;

/// One row of the per-date attendance read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub user_id: String,
    pub is_present: bool,
}

/// Create or overwrite the record keyed by (user, classroom, date)
///
/// Last writer wins; the existing row keeps its id.
pub async fn upsert_attendance_tx(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    classroom_id: &str,
    date: NaiveDate,
    is_present: bool,
) -> std::result::Result<Attendance, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(
        r#"
        INSERT INTO attendance (id, user_id, classroom_id, date, is_present)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id, classroom_id, date) DO UPDATE SET
            is_present = excluded.is_present
        RETURNING id, user_id, classroom_id, date, is_present
        "#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(classroom_id)
    .bind(date)
    .bind(is_present)
    .fetch_one(&mut **tx)
    .await
}

/// Attendance for one classroom and date; no ordering guarantee
pub async fn list_for_date(
    pool: &SqlitePool,
    classroom_id: &str,
    date: NaiveDate,
) -> Result<Vec<AttendanceMark>> {
    let marks = sqlx::query_as::<_, AttendanceMark>(
        "SELECT user_id, is_present FROM attendance WHERE classroom_id = ? AND date = ?",
    )
    .bind(classroom_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(marks)
}

/// Every attendance fact recorded for a user, across classrooms
pub async fn entries_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<AttendanceEntry>> {
    let rows: Vec<(String, NaiveDate, bool)> = sqlx::query_as(
        "SELECT classroom_id, date, is_present FROM attendance WHERE user_id = ? ORDER BY date",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(classroom_id, date, is_present)| AttendanceEntry {
            classroom_id,
            date,
            is_present,
        })
        .collect())
}
