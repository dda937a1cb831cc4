use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{InfoRequest, InfoResponse},
    repo::InfoEntry,
};
use crate::{
    auth::extractors::AdminUser,
    error::{ApiError, ApiResult},
    extract::{parse_id, present, ApiJson},
    state::AppState,
};

pub fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/info", post(create_info))
        .route("/infos", get(list_infos))
        .route("/info/:id", put(update_info).delete(delete_info))
}

fn required_info(payload: InfoRequest) -> ApiResult<String> {
    present(payload.info).ok_or_else(|| ApiError::BadRequest("Info is required".into()))
}

fn info_not_found() -> ApiError {
    ApiError::NotFound("Info not found".into())
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn create_info(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<InfoRequest>,
) -> ApiResult<(StatusCode, Json<InfoResponse>)> {
    let text = required_info(payload)?;
    let entry = state.infos.create(&text).await?;
    info!(info_id = %entry.id, "info saved");
    Ok((
        StatusCode::CREATED,
        Json(InfoResponse {
            message: "Info saved".into(),
            data: entry,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_infos(State(state): State<AppState>) -> ApiResult<Json<Vec<InfoEntry>>> {
    Ok(Json(state.infos.list().await?))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn update_info(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<InfoRequest>,
) -> ApiResult<Json<InfoResponse>> {
    let id = parse_id(&id)?;
    let text = required_info(payload)?;
    let entry = state
        .infos
        .update(id, &text)
        .await?
        .ok_or_else(info_not_found)?;
    info!(info_id = %entry.id, "info updated");
    Ok(Json(InfoResponse {
        message: "Info updated".into(),
        data: entry,
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_info(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InfoResponse>> {
    let id = parse_id(&id)?;
    let entry = state.infos.delete(id).await?.ok_or_else(info_not_found)?;
    info!(info_id = %entry.id, "info deleted");
    Ok(Json(InfoResponse {
        message: "Info deleted".into(),
        data: entry,
    }))
}
