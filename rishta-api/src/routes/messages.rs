use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use rishta_shared::errors::AppResult;
use rishta_shared::types::auth::AuthUser;
use rishta_shared::types::{ApiResponse, Listing, Paginated, PaginationParams};

use crate::events::publisher;
use crate::format::{ConversationView, MessageView};
use crate::routes::presence::mark_online;
use crate::routes::settings::Done;
use crate::services::messaging;
use crate::AppState;

// --- POST /messages ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub match_id: Uuid,
    pub text: String,
}

pub async fn send_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MessageView>>)> {
    let (message, recipient) = messaging::send_message(state.store.as_ref(), user.id, req.match_id, &req.text)?;

    publisher::publish_message_sent(
        &state.rabbitmq,
        message.id,
        message.match_id,
        user.id,
        recipient,
        &message.text,
    )
    .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(MessageView::new(message, user.id)))))
}

// --- GET /messages/:id ---

pub async fn list_messages(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<MessageView>>>> {
    let page = messaging::conversation(state.store.as_ref(), user.id, match_id, &page)?;
    Ok(Json(ApiResponse::ok(page)))
}

// --- GET /messages/conversations ---

pub async fn conversations(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Listing<ConversationView>>>> {
    let mut list = messaging::conversations(state.store.as_ref(), &state.assets, user.id)?;
    mark_online(&state.redis, &mut list).await;
    Ok(Json(ApiResponse::ok(Listing::new(list))))
}

// --- DELETE /messages/:id ---

pub async fn delete_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Done>>> {
    let message = messaging::delete_message(state.store.as_ref(), user.id, message_id)?;
    publisher::publish_message_deleted(&state.rabbitmq, message.id, message.match_id, user.id).await;
    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "message deleted")))
}
