use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";
pub const STATUS_ACTIVE: &str = "ACTIVE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Done => "DONE",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "DONE" => TaskStatus::Done,
            _ => TaskStatus::Pending,
        }
    }
}

/// Task embedded in a user record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub datetime: OffsetDateTime,
    pub status: TaskStatus,
}

#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub datetime: OffsetDateTime,
    pub status: String,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            datetime: r.datetime,
            status: TaskStatus::from_db(&r.status),
        }
    }
}

/// User record as stored. Serializes as the full user document minus the
/// password hash.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 hash, absent for Google-only accounts
    pub google_id: Option<String>,
    pub role: String,
    pub status: String,
    pub buddy_name: Option<String>,
    pub buddy_url: Option<String>,
    pub picture: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[sqlx(skip)]
    pub tasks: Vec<Task>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Fields for a credential signup.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub buddy_url: String,
    pub buddy_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Verified identity used for the Google upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub picture: String,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub datetime: OffsetDateTime,
}

/// Typed partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub picture: Option<String>,
    pub buddy_url: Option<String>,
    pub buddy_name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

impl UserUpdate {
    pub fn apply(&self, user: &mut User) {
        fn set(dst: &mut String, src: &Option<String>) {
            if let Some(v) = src {
                dst.clone_from(v);
            }
        }
        fn set_opt(dst: &mut Option<String>, src: &Option<String>) {
            if let Some(v) = src {
                *dst = Some(v.clone());
            }
        }
        set(&mut user.name, &self.name);
        set(&mut user.email, &self.email);
        set(&mut user.role, &self.role);
        set(&mut user.status, &self.status);
        set_opt(&mut user.picture, &self.picture);
        set_opt(&mut user.buddy_url, &self.buddy_url);
        set_opt(&mut user.buddy_name, &self.buddy_name);
        set_opt(&mut user.department, &self.department);
        set_opt(&mut user.position, &self.position);
    }
}
