//! Database row models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::roles::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub roll_no: Option<String>,
    pub year: Option<String>,
    pub division: Option<String>,
    pub srn: Option<String>,
    pub prn: Option<String>,
    pub office_hours: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: String,
    /// Globally unique join code
    pub code: String,
    pub course_name: String,
    pub course_code: String,
    pub year: Option<String>,
    pub division: Option<String>,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
}

/// Member listing row (membership joined with user)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub roll_no: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub classroom_id: String,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(json)]
    pub requirements: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub max_marks: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub assignment_id: String,
    /// Opaque content reference (usually a stored-file URL)
    pub content: String,
    /// NULL until graded; 0 is also read as "not graded"
    pub marks: Option<f64>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: String,
    pub user_id: String,
    pub classroom_id: String,
    pub date: NaiveDate,
    pub is_present: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub classroom_id: String,
    pub title: String,
    pub category: Option<String>,
    pub uploader_id: Option<String>,
    /// Opaque content reference
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// What produced a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Assignment,
    Attendance,
    Membership,
    Resource,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Assignment => "ASSIGNMENT",
            NotificationType::Attendance => "ATTENDANCE",
            NotificationType::Membership => "MEMBERSHIP",
            NotificationType::Resource => "RESOURCE",
        }
    }
}

/// A notification as seen by one recipient
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
