use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{User, UserUpdate};

/// Request body for `POST /users/signup`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub buddy_url: Option<String>,
    pub buddy_name: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Request body for both credential logins.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub name: Option<String>,
}

/// Self-service update. Only these fields can be changed by the owner;
/// anything else in the body is dropped during deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub picture: Option<String>,
    pub buddy_url: Option<String>,
    pub buddy_name: Option<String>,
}

impl From<ProfileUpdate> for UserUpdate {
    fn from(p: ProfileUpdate) -> Self {
        UserUpdate {
            name: p.name,
            picture: p.picture,
            buddy_url: p.buddy_url,
            buddy_name: p.buddy_name,
            ..Default::default()
        }
    }
}

/// `PATCH /users/signup`: buddy fields of the user called `name`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuddyUpdate {
    pub name: Option<String>,
    pub buddy_url: Option<String>,
    pub buddy_name: Option<String>,
}

/// `PATCH /users/login`: typed update of the user called `name`.
#[derive(Debug, Deserialize)]
pub struct PatchByNameRequest {
    pub name: Option<String>,
    pub updates: Option<UserUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub title: Option<String>,
    pub datetime: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserMessageResponse<U> {
    pub message: String,
    pub user: U,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse<U> {
    pub message: String,
    pub token: String,
    pub user: U,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub user: LoginUser,
}

/// Profile returned by login and name lookup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub buddy_url: Option<String>,
    pub buddy_name: Option<String>,
    pub status: String,
}

impl From<&User> for LoginUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            role: u.role.clone(),
            buddy_url: u.buddy_url.clone(),
            buddy_name: u.buddy_name.clone(),
            status: u.status.clone(),
        }
    }
}

/// Profile returned by the admin login.
#[derive(Debug, Serialize)]
pub struct AdminLoginUser {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub status: String,
}

impl From<&User> for AdminLoginUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            role: u.role.clone(),
            department: u.department.clone(),
            position: u.position.clone(),
            status: u.status.clone(),
        }
    }
}

/// Row of the admin user list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub buddy_url: Option<String>,
    pub buddy_name: Option<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub position: Option<String>,
    pub department: Option<String>,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            buddy_url: u.buddy_url,
            buddy_name: u.buddy_name,
            status: u.status,
            created_at: u.created_at,
            position: u.position,
            department: u.department,
        }
    }
}
