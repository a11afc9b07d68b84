use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rishta_shared::errors::AppResult;
use rishta_shared::types::auth::AuthUser;
use rishta_shared::types::{ApiResponse, Listing};

use crate::engine::{self, Decision, PairStatus};
use crate::events::publisher;
use crate::format::{BrowseCard, NotificationFeed, SentInterest};
use crate::models::Interest;
use crate::routes::settings::Done;
use crate::services::profiles;
use crate::store::Store;
use crate::views;
use crate::AppState;

/// Profile name when there is one, account name otherwise.
pub(crate) fn display_name(store: &dyn Store, user_id: Uuid) -> AppResult<String> {
    if let Some(profile) = store.find_profile_by_user(user_id)? {
        return Ok(profile.full_name);
    }
    Ok(store
        .find_user(user_id)?
        .map(|u| u.name)
        .unwrap_or_else(|| "Someone".into()))
}

// --- POST /interest ---

#[derive(Debug, Deserialize)]
pub struct SendInterestRequest {
    pub to: Uuid,
}

pub async fn send_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendInterestRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Interest>>)> {
    let store = state.store.as_ref();
    let interest = engine::send_interest(store, user.id, req.to)?;
    let sender_name = display_name(store, user.id)?;

    publisher::publish_interest_sent(&state.rabbitmq, interest.id, user.id, req.to, &sender_name).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(interest, "interest sent successfully")),
    ))
}

// --- PUT /interest/:id/accept | /interest/:id/reject ---

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub interest: Interest,
    pub match_id: Option<Uuid>,
    pub status: Option<PairStatus>,
}

async fn respond(
    state: &AppState,
    user: AuthUser,
    interest_id: Uuid,
    decision: Decision,
) -> AppResult<Json<ApiResponse<RespondResponse>>> {
    let outcome = engine::respond_to_interest(state.store.as_ref(), interest_id, user.id, decision)?;
    let interest = outcome.interest;
    let accepted = decision == Decision::Accept;

    publisher::publish_interest_responded(
        &state.rabbitmq,
        interest.id,
        interest.from_user,
        interest.to_user,
        accepted,
    )
    .await;

    if let (true, Some(pair)) = (outcome.became_mutual, &outcome.pair) {
        publisher::publish_match_mutual(&state.rabbitmq, pair.id, interest.from_user, interest.to_user).await;
    }

    let message = if accepted {
        "interest accepted, you can now start messaging"
    } else {
        "interest rejected"
    };
    let body = RespondResponse {
        match_id: outcome.pair.as_ref().map(|m| m.id),
        status: outcome.pair.as_ref().map(PairStatus::of),
        interest,
    };
    Ok(Json(ApiResponse::ok_with_message(body, message)))
}

pub async fn accept_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(interest_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RespondResponse>>> {
    respond(&state, user, interest_id, Decision::Accept).await
}

pub async fn reject_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(interest_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RespondResponse>>> {
    respond(&state, user, interest_id, Decision::Reject).await
}

// --- DELETE /interest/:id ---

pub async fn cancel_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(interest_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Done>>> {
    let outcome = engine::cancel_interest_by_id(state.store.as_ref(), interest_id, user.id)?;

    if let Some(pair) = outcome.match_deleted {
        publisher::publish_match_dissolved(&state.rabbitmq, pair.id, pair.users(), user.id, "cancelled").await;
    }

    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "interest cancelled")))
}

// --- GET /interest/notifications ---

pub async fn notifications(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<NotificationFeed>>> {
    let feed = views::notifications(state.store.as_ref(), &state.assets, user.id)?;
    Ok(Json(ApiResponse::ok(feed)))
}

// --- GET /interest/notifications/unread-count ---

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread_count: i64,
}

pub async fn unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCount>>> {
    let unread_count = state.store.count_pending_to(user.id)?;
    Ok(Json(ApiResponse::ok(UnreadCount { unread_count })))
}

// --- GET /interest/sent ---

pub async fn sent_interests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Listing<SentInterest>>>> {
    let sent = views::sent_interests(state.store.as_ref(), &state.assets, user.id)?;
    Ok(Json(ApiResponse::ok(Listing::new(sent))))
}

// --- Shortlist ---

#[derive(Debug, Deserialize)]
pub struct ShortlistRequest {
    pub profile_id: Uuid,
}

pub async fn shortlist_add(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ShortlistRequest>,
) -> AppResult<Json<ApiResponse<Done>>> {
    profiles::shortlist_add(state.store.as_ref(), user.id, req.profile_id)?;
    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "added to shortlist")))
}

pub async fn shortlist_remove(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ShortlistRequest>,
) -> AppResult<Json<ApiResponse<Done>>> {
    let removed = profiles::shortlist_remove(state.store.as_ref(), user.id, req.profile_id)?;
    Ok(Json(ApiResponse::ok_with_message(Done { ok: removed }, "removed from shortlist")))
}

pub async fn shortlist(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Listing<BrowseCard>>>> {
    let saved = profiles::shortlist(state.store.as_ref(), &state.assets, user.id)?;
    Ok(Json(ApiResponse::ok(Listing::new(saved))))
}
