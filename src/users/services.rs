use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, warn};

use super::dto::SignupRequest;
use super::repo_types::{NewUser, User, UserUpdate, ROLE_ADMIN, ROLE_USER};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::extract::present;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_role(role: &str) -> ApiResult<()> {
    if role == ROLE_USER || role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Unknown role: {}", role)))
    }
}

/// Normalizes an admin edit: known role, lowercased well-formed email.
pub(crate) fn check_admin_update(update: &mut UserUpdate) -> ApiResult<()> {
    if let Some(role) = &update.role {
        validate_role(role)?;
    }
    if let Some(email) = update.email.take() {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email in admin update");
            return Err(ApiError::BadRequest("Invalid email".into()));
        }
        update.email = Some(email);
    }
    Ok(())
}

pub(crate) fn parse_datetime(raw: &str) -> ApiResult<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .map_err(|_| ApiError::BadRequest("datetime must be an RFC 3339 timestamp".into()))
}

/// Creates a credential account. Only an admin caller may hand out a role
/// other than USER.
pub async fn register(
    state: &AppState,
    payload: SignupRequest,
    caller_is_admin: bool,
) -> ApiResult<User> {
    let (Some(name), Some(email), Some(password)) = (
        present(payload.name),
        present(payload.email).map(|e| e.to_lowercase()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Name, email and password are required".into(),
        ));
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let role = present(payload.role).unwrap_or_else(|| ROLE_USER.to_string());
    validate_role(&role)?;
    if role != ROLE_USER && !caller_is_admin {
        warn!(email = %email, role = %role, "role assignment without admin token");
        return Err(ApiError::Forbidden("Only admins can assign roles".into()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&password)?;

    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            role,
            buddy_url: payload.buddy_url.unwrap_or_default(),
            buddy_name: payload.buddy_name.unwrap_or_default(),
            department: payload.department,
            position: payload.position,
        })
        .await?;
    Ok(user)
}

/// Credential check by name. Unknown names are 404, bad passwords 401.
pub async fn authenticate(
    state: &AppState,
    name: Option<String>,
    password: Option<String>,
) -> ApiResult<User> {
    let (Some(name), Some(password)) = (present(name), password.filter(|p| !p.is_empty())) else {
        return Err(ApiError::BadRequest("Name and password are required".into()));
    };

    let user = state
        .users
        .find_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let ok = verify_password(&password, user.password_hash.as_deref()).map_err(|e| {
        error!(error = %e, user_id = %user.id, "stored password hash is unreadable");
        ApiError::Internal(e)
    })?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Wrong password".into()));
    }
    Ok(user)
}

pub fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    Ok(state.jwt.sign(user.id, &user.email, &user.name)?)
}
