use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use rishta_shared::errors::AppResult;
use rishta_shared::types::auth::AuthUser;
use rishta_shared::types::ApiResponse;

use crate::format::{BrowseCard, ProfileView};
use crate::routes::settings::Done;
use crate::services::profiles::{self, ProfileInput};
use crate::AppState;

// --- GET /profile/me ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let profile = profiles::my_profile(state.store.as_ref(), user.id)?;
    Ok(Json(ApiResponse::ok(ProfileView::new(profile, &state.assets))))
}

// --- POST /profile ---

/// Creates the profile, or updates it when one already exists.
pub async fn save_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProfileInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProfileView>>)> {
    let (profile, created) = profiles::save_profile(state.store.as_ref(), user.id, input)?;
    let view = ProfileView::new(profile, &state.assets);

    if created {
        Ok((StatusCode::CREATED, Json(ApiResponse::ok_with_message(view, "profile created successfully"))))
    } else {
        Ok((StatusCode::OK, Json(ApiResponse::ok_with_message(view, "profile updated successfully"))))
    }
}

// --- PUT /profile/me ---

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProfileInput>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let (profile, _) = profiles::save_profile(state.store.as_ref(), user.id, input)?;
    Ok(Json(ApiResponse::ok_with_message(
        ProfileView::new(profile, &state.assets),
        "profile updated successfully",
    )))
}

// --- DELETE /profile/me ---

pub async fn delete_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Done>>> {
    profiles::delete_profile(state.store.as_ref(), user.id)?;
    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "profile deleted")))
}

// --- GET /profile/approved ---

pub async fn approved_profiles(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<BrowseCard>>>> {
    let limit = state.config.browse_limit;
    let cards = profiles::approved_profiles(state.store.as_ref(), &state.assets, limit)?;
    Ok(Json(ApiResponse::ok(cards)))
}

// --- PUT /profile/:id/status ---

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

pub async fn update_profile_status(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    Json(input): Json<StatusInput>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let profile =
        profiles::set_profile_status(state.store.as_ref(), user.role, profile_id, &input.status)?;
    Ok(Json(ApiResponse::ok_with_message(
        ProfileView::new(profile, &state.assets),
        "profile status updated",
    )))
}
