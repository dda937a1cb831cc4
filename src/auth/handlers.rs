use axum::{extract::State, routing::post, Json, Router};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{GoogleAuthRequest, GoogleAuthResponse},
    google::VerifyError,
};
use crate::{
    error::{ApiError, ApiResult},
    extract::ApiJson,
    state::AppState,
    users::{repo_types::GoogleProfile, services::issue_token},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/google", post(google_auth))
}

#[instrument(skip(state, payload))]
pub async fn google_auth(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GoogleAuthRequest>,
) -> ApiResult<Json<GoogleAuthResponse>> {
    let id_token = payload
        .id_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing Google token".into()))?;

    let identity = match state.google.verify(&id_token).await {
        Ok(identity) => identity,
        Err(VerifyError::Rejected(reason)) => {
            warn!(reason = %reason, "google token rejected");
            return Err(ApiError::Unauthorized("Invalid Google token".into()));
        }
        Err(e) => {
            error!(error = %e, "google token verification failed");
            return Err(ApiError::Internal(e.into()));
        }
    };

    let profile = GoogleProfile {
        google_id: identity.sub,
        email: identity.email.to_lowercase(),
        name: identity.name.unwrap_or_default(),
        picture: identity.picture.unwrap_or_default(),
    };
    let user = state.users.upsert_google(&profile).await?;
    let token = issue_token(&state, &user)?;

    info!(user_id = %user.id, "google sign-in");
    Ok(Json(GoogleAuthResponse {
        token,
        user: user.into(),
    }))
}
