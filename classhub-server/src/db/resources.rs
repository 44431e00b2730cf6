//! Shared resource queries

use chrono::Utc;
use classhub_common::db::Resource;
use classhub_common::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::new_id;

const RESOURCE_COLUMNS: &str = "id, classroom_id, title, category, uploader_id, url, created_at";

#[derive(Debug, Clone)]
pub struct NewResource {
    pub classroom_id: String,
    pub title: String,
    pub category: Option<String>,
    pub uploader_id: String,
    pub url: String,
}

pub async fn insert_resource_tx(
    tx: &mut Transaction<'_, Sqlite>,
    new: &NewResource,
) -> Result<Resource> {
    let resource = sqlx::query_as::<_, Resource>(&format!(
        r#"
        INSERT INTO resources (id, classroom_id, title, category, uploader_id, url, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        RESOURCE_COLUMNS
    ))
    .bind(new_id())
    .bind(&new.classroom_id)
    .bind(&new.title)
    .bind(&new.category)
    .bind(&new.uploader_id)
    .bind(&new.url)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(resource)
}

pub async fn get_resource(pool: &SqlitePool, resource_id: &str) -> Result<Option<Resource>> {
    let resource = sqlx::query_as::<_, Resource>(&format!(
        "SELECT {} FROM resources WHERE id = ?",
        RESOURCE_COLUMNS
    ))
    .bind(resource_id)
    .fetch_optional(pool)
    .await?;

    Ok(resource)
}

/// Resources of a classroom, optionally restricted to one category
pub async fn list_for_classroom(
    pool: &SqlitePool,
    classroom_id: &str,
    category: Option<&str>,
) -> Result<Vec<Resource>> {
    let resources = sqlx::query_as::<_, Resource>(&format!(
        r#"
        SELECT {} FROM resources
        WHERE classroom_id = ? AND (? IS NULL OR category = ?)
        ORDER BY created_at DESC
        "#,
        RESOURCE_COLUMNS
    ))
    .bind(classroom_id)
    .bind(category)
    .bind(category)
    .fetch_all(pool)
    .await?;

    Ok(resources)
}

pub async fn delete_resource(pool: &SqlitePool, resource_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM resources WHERE id = ?")
        .bind(resource_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
