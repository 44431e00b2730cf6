//! Classroom and membership queries

use chrono::Utc;
use classhub_common::db::{Classroom, Member};
use classhub_common::stats::CourseLabel;
use classhub_common::{Result, Role};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::new_id;

const CLASSROOM_COLUMNS: &str =
    "c.id, c.code, c.course_name, c.course_code, c.year, c.division, c.creator_id, c.created_at";

/// Fields supplied when opening a classroom
#[derive(Debug, Clone)]
pub struct NewClassroom {
    pub course_name: String,
    pub course_code: String,
    pub year: Option<String>,
    pub division: Option<String>,
    pub creator_id: String,
}

/// Insert a classroom with the given join code and enroll its creator.
///
/// Both rows are written in one transaction. A duplicate `code` surfaces
/// as a UNIQUE violation for the caller to retry with a fresh code.
pub async fn insert_classroom(
    pool: &SqlitePool,
    new: &NewClassroom,
    code: &str,
) -> std::result::Result<Classroom, sqlx::Error> {
    let now = Utc::now();
    let id = new_id();
    let mut tx = pool.begin().await?;

    let classroom = sqlx::query_as::<_, Classroom>(
        r#"
        INSERT INTO classrooms (id, code, course_name, course_code, year, division, creator_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, code, course_name, course_code, year, division, creator_id, created_at
        "#,
    )
    .bind(&id)
    .bind(code)
    .bind(&new.course_name)
    .bind(&new.course_code)
    .bind(&new.year)
    .bind(&new.division)
    .bind(&new.creator_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    add_member_tx(&mut tx, &new.creator_id, &id).await?;

    tx.commit().await?;
    Ok(classroom)
}

pub async fn get_classroom(pool: &SqlitePool, classroom_id: &str) -> Result<Option<Classroom>> {
    let classroom = sqlx::query_as::<_, Classroom>(&format!(
        "SELECT {} FROM classrooms c WHERE c.id = ?",
        CLASSROOM_COLUMNS
    ))
    .bind(classroom_id)
    .fetch_optional(pool)
    .await?;

    Ok(classroom)
}

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Classroom>> {
    let classroom = sqlx::query_as::<_, Classroom>(&format!(
        "SELECT {} FROM classrooms c WHERE c.code = ?",
        CLASSROOM_COLUMNS
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(classroom)
}

/// Classrooms the user belongs to, newest first
pub async fn list_for_member(pool: &SqlitePool, user_id: &str) -> Result<Vec<Classroom>> {
    let classrooms = sqlx::query_as::<_, Classroom>(&format!(
        r#"
        SELECT {} FROM classrooms c
        JOIN memberships m ON m.classroom_id = c.id
        WHERE m.user_id = ?
        ORDER BY c.created_at DESC
        "#,
        CLASSROOM_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(classrooms)
}

/// Display labels for every classroom the user belongs to
pub async fn course_labels_for_member(pool: &SqlitePool, user_id: &str) -> Result<Vec<CourseLabel>> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT c.id, c.course_name, c.course_code FROM classrooms c
        JOIN memberships m ON m.classroom_id = c.id
        WHERE m.user_id = ?
        ORDER BY c.course_name, c.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(classroom_id, course_name, course_code)| CourseLabel {
            classroom_id,
            course_name,
            course_code,
        })
        .collect())
}

pub async fn delete_classroom(pool: &SqlitePool, classroom_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM classrooms WHERE id = ?")
        .bind(classroom_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_member(pool: &SqlitePool, user_id: &str, classroom_id: &str) -> Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM memberships WHERE user_id = ? AND classroom_id = ?")
            .bind(user_id)
            .bind(classroom_id)
            .fetch_optional(pool)
            .await?;

    Ok(found.is_some())
}

/// Enroll a user inside the caller's transaction; returns false when
/// already enrolled
pub async fn add_member_tx(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    classroom_id: &str,
) -> std::result::Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO memberships (id, user_id, classroom_id, joined_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, classroom_id) DO NOTHING
        "#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(classroom_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Leave a classroom. Attendance history is kept.
pub async fn remove_member(pool: &SqlitePool, user_id: &str, classroom_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM memberships WHERE user_id = ? AND classroom_id = ?")
        .bind(user_id)
        .bind(classroom_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Members with staff first, then by roll number and name
pub async fn list_members(pool: &SqlitePool, classroom_id: &str) -> Result<Vec<Member>> {
    let members = sqlx::query_as::<_, Member>(
        r#"
        SELECT u.id AS user_id, u.name, u.email, u.role, u.roll_no, m.joined_at
        FROM memberships m
        JOIN users u ON u.id = m.user_id
        WHERE m.classroom_id = ?
        ORDER BY CASE u.role WHEN 'STUDENT' THEN 1 ELSE 0 END, COALESCE(u.roll_no, ''), u.name
        "#,
    )
    .bind(classroom_id)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

/// Ids of members holding `role`
pub async fn member_ids_with_role(
    pool: &SqlitePool,
    classroom_id: &str,
    role: Role,
) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar(
        r#"
        SELECT m.user_id FROM memberships m
        JOIN users u ON u.id = m.user_id
        WHERE m.classroom_id = ? AND u.role = ?
        ORDER BY m.user_id
        "#,
    )
    .bind(classroom_id)
    .bind(role)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Whether `user_id` belongs to some classroom created by `creator_id`
pub async fn created_classroom_has_member(
    pool: &SqlitePool,
    creator_id: &str,
    user_id: &str,
) -> Result<bool> {
    let found: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM memberships m
            JOIN classrooms c ON c.id = m.classroom_id
            WHERE c.creator_id = ? AND m.user_id = ?
        )
        "#,
    )
    .bind(creator_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(found)
}

/// Ids of every member
pub async fn member_ids(pool: &SqlitePool, classroom_id: &str) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar(
        "SELECT user_id FROM memberships WHERE classroom_id = ? ORDER BY user_id",
    )
    .bind(classroom_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

pub async fn member_count(pool: &SqlitePool, classroom_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM memberships WHERE classroom_id = ?")
        .bind(classroom_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
