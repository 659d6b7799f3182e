//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::UserId,
    infrastructure::dto::http::{ErrorDto, OnlineUsersDto, PresenceDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Users that currently hold a relay connection, sorted by id
pub async fn get_online_users(State(state): State<Arc<AppState>>) -> Json<OnlineUsersDto> {
    let online = state
        .get_presence_usecase
        .online_users()
        .await
        .into_iter()
        .map(UserId::into_string)
        .collect();

    Json(OnlineUsersDto { online })
}

/// Presence of a single user
pub async fn get_user_presence(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<PresenceDto>, (StatusCode, Json<ErrorDto>)> {
    let user_id = UserId::try_from(user_id).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorDto {
                message: e.to_string(),
            }),
        )
    })?;

    let online = state.get_presence_usecase.is_online(&user_id).await;
    Ok(Json(PresenceDto {
        user_id: user_id.into_string(),
        online,
    }))
}
