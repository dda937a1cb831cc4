use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use super::client::ChatError;
use crate::{
    error::{ApiError, ApiResult},
    extract::ApiJson,
    state::AppState,
};

const NO_INFO_NOTICE: &str = "There is currently no information in our knowledge base.";

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/openai/ask", post(ask))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub messages: Value,
}

/// System message carrying the knowledge base, newest entry first.
pub(crate) fn context_message(infos: &[String]) -> Value {
    let text = infos.join("\n");
    let content = if text.trim().is_empty() {
        NO_INFO_NOTICE.to_string()
    } else {
        format!("Here is the known information:\n{}", text)
    };
    json!({ "role": "system", "content": content })
}

#[instrument(skip(state, payload))]
pub async fn ask(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AskRequest>,
) -> ApiResult<Response> {
    let Value::Array(messages) = payload.messages else {
        return Err(ApiError::BadRequest("Invalid messages format".into()));
    };

    let infos: Vec<String> = state
        .infos
        .list()
        .await?
        .into_iter()
        .map(|entry| entry.info)
        .collect();

    let mut full = Vec::with_capacity(messages.len() + 1);
    full.push(context_message(&infos));
    full.extend(messages);

    let reply = state.chat.complete(full).await.map_err(|e: ChatError| {
        error!(error = %e, "chat completion failed");
        ApiError::Internal(e.into())
    })?;

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    info!(status = reply.status, knowledge_entries = infos.len(), "chat answered");
    Ok((status, Json(reply.body)).into_response())
}
