use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::User;

/// Request body for `POST /auth/google`.
#[derive(Debug, Deserialize)]
pub struct GoogleAuthRequest {
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GoogleAuthResponse {
    pub token: String,
    pub user: GoogleUser,
}

/// Profile returned after Google sign-in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub buddy_name: Option<String>,
    pub buddy_url: Option<String>,
    pub picture: Option<String>,
    pub role: String,
    pub status: String,
}

impl From<User> for GoogleUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            buddy_name: u.buddy_name,
            buddy_url: u.buddy_url,
            picture: u.picture,
            role: u.role,
            status: u.status,
        }
    }
}
