//! User account queries

use chrono::Utc;
use classhub_common::db::User;
use classhub_common::{Result, Role};
use serde::Deserialize;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, name, email, role, roll_no, year, division, srn, prn, office_hours, created_at, updated_at";

/// Self-service profile fields
///
/// `role` is honored only when the account is first created, and never
/// as `ADMIN`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub roll_no: Option<String>,
    pub year: Option<String>,
    pub division: Option<String>,
    pub srn: Option<String>,
    pub prn: Option<String>,
    pub office_hours: Option<String>,
}

/// Fields an admin may change on any account; `None` leaves a field alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub roll_no: Option<String>,
    pub year: Option<String>,
    pub division: Option<String>,
}

pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY name, id",
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Create the account on first sign-in, or update the caller's own profile
pub async fn upsert_profile(
    pool: &SqlitePool,
    user_id: &str,
    profile: &ProfileUpdate,
) -> Result<User> {
    let now = Utc::now();
    let initial_role = match profile.role {
        Some(Role::Professor) => Role::Professor,
        _ => Role::Student,
    };

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (
            id, name, email, role, roll_no, year, division, srn, prn, office_hours,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            email = excluded.email,
            roll_no = excluded.roll_no,
            year = excluded.year,
            division = excluded.division,
            srn = excluded.srn,
            prn = excluded.prn,
            office_hours = excluded.office_hours,
            updated_at = excluded.updated_at
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(initial_role)
    .bind(&profile.roll_no)
    .bind(&profile.year)
    .bind(&profile.division)
    .bind(&profile.srn)
    .bind(&profile.prn)
    .bind(&profile.office_hours)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Apply an admin edit; returns `None` when the user does not exist
pub async fn update_user(
    pool: &SqlitePool,
    user_id: &str,
    update: &AdminUserUpdate,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            role = COALESCE(?, role),
            roll_no = COALESCE(?, roll_no),
            year = COALESCE(?, year),
            division = COALESCE(?, division),
            updated_at = ?
        WHERE id = ?
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(&update.name)
    .bind(&update.email)
    .bind(update.role)
    .bind(&update.roll_no)
    .bind(&update.year)
    .bind(&update.division)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Promote an existing account to admin; returns whether a row changed
pub async fn promote_to_admin(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(Role::Admin)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete an account; owned classrooms, memberships and records cascade
pub async fn delete_user(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// `(id, email)` for the given users that have an e-mail address on file
pub async fn emails_for(pool: &SqlitePool, user_ids: &[String]) -> Result<Vec<(String, String)>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = sqlx::QueryBuilder::new(
        "SELECT id, email FROM users WHERE email IS NOT NULL AND email <> '' AND id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in user_ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let rows = builder
        .build_query_as::<(String, String)>()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
