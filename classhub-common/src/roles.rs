//! User roles and authorization predicates
//!
//! Every handler that needs a permission decision asks one of the
//! predicates here instead of comparing role strings inline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Role carried by every user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Professor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Professor => "PROFESSOR",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Professor | Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Role::Student),
            "PROFESSOR" => Ok(Role::Professor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Only professors and admins may open a classroom.
pub fn can_create_classroom(role: Role) -> bool {
    role.is_staff()
}

/// Classroom-scoped management (delete classroom, post assignments, mark
/// attendance, remove resources): the creator, or any admin.
pub fn can_manage_classroom(role: Role, is_creator: bool) -> bool {
    match role {
        Role::Admin => true,
        Role::Professor => is_creator,
        Role::Student => false,
    }
}

/// Grading requires staff role and management rights on the classroom.
pub fn can_grade(role: Role, is_creator: bool) -> bool {
    role.is_staff() && can_manage_classroom(role, is_creator)
}

/// Read access to classroom content: members, plus admins.
pub fn can_view_classroom(role: Role, is_member: bool) -> bool {
    is_member || role == Role::Admin
}

/// Reading a user's report: the user themself, a professor who runs one
/// of the user's classrooms, or any admin.
pub fn can_view_student_report(role: Role, is_self: bool, teaches_user: bool) -> bool {
    match role {
        Role::Admin => true,
        Role::Professor => is_self || teaches_user,
        Role::Student => is_self,
    }
}

/// Account administration (role changes, deletion of other users).
pub fn can_administer_users(role: Role) -> bool {
    role == Role::Admin
}
