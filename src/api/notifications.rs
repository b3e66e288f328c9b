use axum::{extract::State, Extension, Json};

use crate::api::state::AppState;
use crate::db::models::NotificationView;
use crate::db::NotificationRepository;
use crate::error::ApiError;

/// GET /api/notifications — newest first; listing marks them read.
pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
) -> Result<Json<Vec<NotificationView>>, ApiError> {
    let notifications = NotificationRepository::list_for_user(&state.db, &user_id).await?;
    Ok(Json(notifications))
}

/// DELETE /api/notifications — clear all. Selective deletion does not exist.
pub async fn delete_notifications(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = NotificationRepository::clear_for_user(&state.db, &user_id).await?;
    tracing::debug!(user_id = %user_id, removed, "notifications cleared");
    Ok(Json(serde_json::json!({ "message": "Notifications deleted successfully" })))
}
