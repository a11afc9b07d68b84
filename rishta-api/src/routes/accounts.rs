use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use rishta_shared::errors::AppResult;
use rishta_shared::types::ApiResponse;

use crate::events::publisher;
use crate::services::accounts::{self, SettingsView, SignupRequest};
use crate::AppState;

/// POST /accounts/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SettingsView>>)> {
    let user = accounts::signup(state.store.as_ref(), req)?;

    publisher::publish_user_signed_up(&state.rabbitmq, user.id, &user.email).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(SettingsView::from(&user), "account created")),
    ))
}
