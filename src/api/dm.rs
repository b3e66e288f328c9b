use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::db::models::{ConversationRow, ConversationView, MessageRow};
use crate::db::{ConversationRepository, UserRepository};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    pub recipient_id: String,
}

/// POST /api/dm/start — create (or return) the conversation with a recipient.
/// Lazy creation keeps one conversation per unordered pair.
pub async fn start_conversation(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Json(req): Json<StartConversationRequest>,
) -> Result<Json<ConversationRow>, ApiError> {
    if req.recipient_id == user_id {
        return Err(ApiError::validation(
            "Cannot start a conversation with yourself",
        ));
    }

    if !UserRepository::exists(&state.db, &req.recipient_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let conversation =
        ConversationRepository::get_or_create(&state.db, &user_id, &req.recipient_id).await?;

    Ok(Json(conversation))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// POST /api/dm/message/:id — append a message to an existing conversation.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<MessageRow>, ApiError> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::validation("Message text is required"));
    }

    let conversation = ConversationRepository::get(&state.db, &conversation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    if !conversation.has_participant(&user_id) {
        return Err(ApiError::Forbidden(
            "You are not a participant in this conversation".to_string(),
        ));
    }

    let message =
        ConversationRepository::append_message(&state.db, &conversation.id, &user_id, &text)
            .await?;

    Ok(Json(message))
}

/// GET /api/dm/conversations — most recently updated first.
pub async fn get_conversations(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
) -> Result<Json<Vec<ConversationView>>, ApiError> {
    let conversations = ConversationRepository::list_for_user(&state.db, &user_id).await?;
    Ok(Json(conversations))
}

/// GET /api/dm/:id/messages — oldest first, participants only.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(user_id): Extension<String>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<MessageRow>>, ApiError> {
    let conversation = ConversationRepository::get(&state.db, &conversation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    if !conversation.has_participant(&user_id) {
        return Err(ApiError::Forbidden(
            "You are not a participant in this conversation".to_string(),
        ));
    }

    let messages = ConversationRepository::messages(&state.db, &conversation.id).await?;
    Ok(Json(messages))
}
