use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{LatestNotif, NotifRequest, NotifResponse},
    repo::AdminNotif,
};
use crate::{
    auth::extractors::AdminUser,
    error::{ApiError, ApiResult},
    extract::{parse_id, present, ApiJson},
    state::AppState,
};

pub fn notif_routes() -> Router<AppState> {
    Router::new()
        .route("/notif/admin", post(create_notif))
        .route("/notif/all", get(list_notifs))
        .route("/notif/latest", get(latest_notif))
        .route("/notif/:id", put(update_notif).delete(delete_notif))
}

fn notif_not_found() -> ApiError {
    ApiError::NotFound("Notif not found".into())
}

fn required_text(payload: NotifRequest) -> ApiResult<(String, Option<String>)> {
    let text = present(payload.ad_notif)
        .ok_or_else(|| ApiError::BadRequest("AdNotif is required".into()))?;
    Ok((text, payload.title))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn create_notif(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<NotifRequest>,
) -> ApiResult<(StatusCode, Json<NotifResponse>)> {
    let (text, title) = required_text(payload)?;
    let notif = state.notifs.create(&text, title.as_deref()).await?;
    info!(notif_id = %notif.id, "notif created");
    Ok((
        StatusCode::CREATED,
        Json(NotifResponse {
            message: "Notif saved".into(),
            data: notif,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_notifs(State(state): State<AppState>) -> ApiResult<Json<Vec<AdminNotif>>> {
    let notifs = state.notifs.list().await?;
    if notifs.is_empty() {
        return Err(ApiError::NotFound("No notifs found".into()));
    }
    Ok(Json(notifs))
}

#[instrument(skip(state))]
pub async fn latest_notif(State(state): State<AppState>) -> ApiResult<Json<LatestNotif>> {
    let notif = state.notifs.latest().await?.ok_or_else(notif_not_found)?;
    Ok(Json(notif.into()))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn update_notif(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<NotifRequest>,
) -> ApiResult<Json<NotifResponse>> {
    let id = parse_id(&id)?;
    let (text, title) = required_text(payload)?;
    let notif = state
        .notifs
        .update(id, &text, title.as_deref())
        .await?
        .ok_or_else(notif_not_found)?;
    info!(notif_id = %notif.id, "notif updated");
    Ok(Json(NotifResponse {
        message: "Notif updated".into(),
        data: notif,
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_notif(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<NotifResponse>> {
    let id = parse_id(&id)?;
    let notif = state.notifs.delete(id).await?.ok_or_else(notif_not_found)?;
    info!(notif_id = %notif.id, "notif deleted");
    Ok(Json(NotifResponse {
        message: "Notif deleted".into(),
        data: notif,
    }))
}
