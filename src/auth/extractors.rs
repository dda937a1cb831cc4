use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{
    claims::Claims,
    jwt::{JwtKeys, TokenError},
};
use crate::{error::ApiError, state::AppState, users::repo_types::User};

/// Verified bearer-token claims of the caller.
#[derive(Debug)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Only "Bearer <token>" counts; anything else is treated as no token.
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("No token".into()))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(TokenError::IncompleteClaims) => {
                warn!("token payload is missing sub, email or name");
                Err(ApiError::Unauthorized("Invalid token payload".into()))
            }
            Err(e) => {
                warn!(error = %e, "rejected bearer token");
                Err(ApiError::Unauthorized("Invalid token".into()))
            }
        }
    }
}

/// Caller whose stored account has the ADMIN role.
#[derive(Debug)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;

        // Tokens outlive account deletion, so the role is read from the store.
        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".into()))?;

        if !user.is_admin() {
            warn!(user_id = %user.id, "admin route called by non-admin");
            return Err(ApiError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}
