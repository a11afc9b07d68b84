use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use rishta_shared::errors::AppResult;
use rishta_shared::types::auth::AuthUser;
use rishta_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{NotificationSettings, PrivacySettings};
use crate::routes::presence::presence_key;
use crate::services::accounts::{self, AccountUpdate, PasswordChange, SettingsView};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Done {
    pub ok: bool,
}

// --- GET /settings ---

pub async fn get_settings(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<SettingsView>>> {
    Ok(Json(ApiResponse::ok(accounts::settings(state.store.as_ref(), user.id)?)))
}

// --- PUT /settings/account ---

pub async fn update_account(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AccountUpdate>,
) -> AppResult<Json<ApiResponse<SettingsView>>> {
    let view = accounts::update_account(state.store.as_ref(), user.id, req)?;
    Ok(Json(ApiResponse::ok_with_message(view, "account updated")))
}

// --- PUT /settings/password ---

pub async fn change_password(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordChange>,
) -> AppResult<Json<ApiResponse<Done>>> {
    accounts::change_password(state.store.as_ref(), user.id, req)?;
    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "password updated successfully")))
}

// --- PUT /settings/privacy ---

pub async fn update_privacy(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<PrivacySettings>,
) -> AppResult<Json<ApiResponse<PrivacySettings>>> {
    let privacy = accounts::update_privacy(state.store.as_ref(), user.id, req)?;
    Ok(Json(ApiResponse::ok_with_message(privacy, "privacy settings updated")))
}

// --- PUT /settings/notifications ---

pub async fn update_notifications(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<NotificationSettings>,
) -> AppResult<Json<ApiResponse<NotificationSettings>>> {
    let notifications = accounts::update_notifications(state.store.as_ref(), user.id, req)?;
    Ok(Json(ApiResponse::ok_with_message(notifications, "notification settings updated")))
}

// --- PUT /settings/active ---

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct ActiveResponse {
    pub is_active: bool,
}

pub async fn set_active(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActiveRequest>,
) -> AppResult<Json<ApiResponse<ActiveResponse>>> {
    let is_active = accounts::set_active(state.store.as_ref(), user.id, req.is_active)?;
    if !is_active {
        if let Err(e) = state.redis.del(&presence_key(user.id)).await {
            tracing::warn!(error = %e, user_id = %user.id, "failed to clear presence");
        }
    }
    Ok(Json(ApiResponse::ok(ActiveResponse { is_active })))
}

// --- DELETE /settings/account ---

pub async fn delete_account(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Done>>> {
    accounts::delete_account(state.store.as_ref(), user.id)?;

    if let Err(e) = state.redis.del(&presence_key(user.id)).await {
        tracing::warn!(error = %e, user_id = %user.id, "failed to clear presence");
    }
    publisher::publish_user_deleted(&state.rabbitmq, user.id).await;

    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "account deleted")))
}
