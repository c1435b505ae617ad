//! Notification inbox endpoints.
//!
//! Every operation is scoped to the authenticated user; a notification id
//! belonging to someone else behaves exactly like a missing one.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::models::notification::Notification;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", patch(mark_read))
        .route("/notifications/{id}/dismiss", patch(dismiss))
        .route("/notifications/{id}", delete(delete_notification))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

async fn list_notifications(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let rows = state
        .notifications
        .list_for_user(&user_id, query.unread_only)
        .await?;
    Ok(Json(rows))
}

async fn mark_read(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let row = state
        .notifications
        .mark_read(&id, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    Ok(Json(row))
}

async fn dismiss(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let row = state
        .notifications
        .dismiss(&id, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    Ok(Json(row))
}

async fn delete_notification(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.notifications.delete(&id, &user_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
