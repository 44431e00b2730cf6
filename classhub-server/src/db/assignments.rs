//! Assignment queries

use chrono::{DateTime, Utc};
use classhub_common::db::Assignment;
use classhub_common::Result;
use sqlx::types::Json;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::new_id;

const ASSIGNMENT_COLUMNS: &str =
    "id, classroom_id, title, description, requirements, deadline, max_marks, created_at";

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub classroom_id: String,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub max_marks: f64,
}

pub async fn insert_assignment_tx(
    tx: &mut Transaction<'_, Sqlite>,
    new: &NewAssignment,
) -> Result<Assignment> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        r#"
        INSERT INTO assignments (id, classroom_id, title, description, requirements, deadline, max_marks, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        ASSIGNMENT_COLUMNS
    ))
    .bind(new_id())
    .bind(&new.classroom_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(Json(new.requirements.clone()))
    .bind(new.deadline)
    .bind(new.max_marks)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(assignment)
}

pub async fn get_assignment(pool: &SqlitePool, assignment_id: &str) -> Result<Option<Assignment>> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE id = ?",
        ASSIGNMENT_COLUMNS
    ))
    .bind(assignment_id)
    .fetch_optional(pool)
    .await?;

    Ok(assignment)
}

/// Assignments of a classroom, nearest deadline first
pub async fn list_for_classroom(pool: &SqlitePool, classroom_id: &str) -> Result<Vec<Assignment>> {
    let assignments = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE classroom_id = ? ORDER BY deadline, created_at",
        ASSIGNMENT_COLUMNS
    ))
    .bind(classroom_id)
    .fetch_all(pool)
    .await?;

    Ok(assignments)
}

/// Delete an assignment; its submissions cascade
pub async fn delete_assignment(pool: &SqlitePool, assignment_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = ?")
        .bind(assignment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
