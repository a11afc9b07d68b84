use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use rishta_shared::errors::{AppError, AppResult};
use rishta_shared::types::auth::AuthUser;
use rishta_shared::types::{ApiResponse, Listing};

use crate::engine::{self, PairStatus};
use crate::events::publisher;
use crate::format::{BrowseCard, Directory, MatchView, PersonCard};
use crate::routes::interest::display_name;
use crate::routes::presence::mark_online;
use crate::routes::settings::Done;
use crate::views::{self, BrowseFilter};
use crate::AppState;

async fn listing(state: &AppState, mut items: Vec<MatchView>) -> Json<ApiResponse<Listing<MatchView>>> {
    mark_online(&state.redis, &mut items).await;
    Json(ApiResponse::ok(Listing::new(items)))
}

// --- GET /match ---

pub async fn my_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Listing<MatchView>>>> {
    let items = views::my_matches(state.store.as_ref(), &state.assets, user.id)?;
    Ok(listing(&state, items).await)
}

// --- GET /match/friends ---

pub async fn friends(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Listing<MatchView>>>> {
    let items = views::friends(state.store.as_ref(), &state.assets, user.id)?;
    Ok(listing(&state, items).await)
}

// --- GET /match/requests ---

pub async fn pending_requests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Listing<MatchView>>>> {
    let items = views::pending_requests(state.store.as_ref(), &state.assets, user.id)?;
    Ok(listing(&state, items).await)
}

// --- GET /match/sent ---

pub async fn sent_requests(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Listing<MatchView>>>> {
    let items = views::sent_requests(state.store.as_ref(), &state.assets, user.id)?;
    Ok(listing(&state, items).await)
}

// --- POST /match/interest/:id ---

#[derive(Debug, Serialize)]
pub struct ExpressResponse {
    #[serde(rename = "match")]
    pub pair: MatchView,
    pub sender: PersonCard,
    pub receiver: PersonCard,
    pub status: PairStatus,
    pub already_sent: bool,
}

pub async fn express_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(receiver): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ExpressResponse>>> {
    let store = state.store.as_ref();
    let outcome = engine::express_interest(store, user.id, receiver)?;

    let directory = Directory::load(store, &[user.id, receiver])?;
    let (Some(sender), Some(receiver_card)) = (
        directory.card(user.id, &state.assets),
        directory.card(receiver, &state.assets),
    ) else {
        return Err(AppError::internal("match member vanished while expressing interest"));
    };

    if !outcome.already_sent {
        let sender_name = display_name(store, user.id)?;
        publisher::publish_interest_sent(&state.rabbitmq, outcome.interest.id, user.id, receiver, &sender_name)
            .await;
    }
    if outcome.became_mutual {
        publisher::publish_match_mutual(&state.rabbitmq, outcome.pair.id, user.id, receiver).await;
    }

    let message = if outcome.already_sent {
        "interest already sent"
    } else if outcome.status == PairStatus::Friends {
        "it's a match!"
    } else {
        "interest sent"
    };
    let body = ExpressResponse {
        pair: MatchView::new(&outcome.pair, user.id, receiver_card.clone()),
        sender,
        receiver: receiver_card,
        status: outcome.status,
        already_sent: outcome.already_sent,
    };
    Ok(Json(ApiResponse::ok_with_message(body, message)))
}

// --- PUT /match/:id/remove-interest ---

pub async fn remove_interest(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Done>>> {
    let outcome = engine::cancel_by_match(state.store.as_ref(), match_id, user.id)?;

    if let Some(pair) = outcome.match_deleted {
        publisher::publish_match_dissolved(&state.rabbitmq, pair.id, pair.users(), user.id, "cancelled").await;
    }

    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "interest removed")))
}

// --- PUT /match/:id/unfriend ---

pub async fn unfriend(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Done>>> {
    let pair = engine::unfriend(state.store.as_ref(), match_id, user.id)?;
    publisher::publish_match_dissolved(&state.rabbitmq, pair.id, pair.users(), user.id, "unfriended").await;
    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "unfriended successfully")))
}

// --- DELETE /match/:id ---

pub async fn delete_conversation(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Done>>> {
    let pair = engine::delete_conversation(state.store.as_ref(), match_id, user.id)?;
    publisher::publish_match_dissolved(&state.rabbitmq, pair.id, pair.users(), user.id, "conversation_deleted")
        .await;
    Ok(Json(ApiResponse::ok_with_message(Done { ok: true }, "conversation deleted")))
}

// --- GET /match/browse | /match/browse/filter ---

async fn browse_with(
    state: &AppState,
    viewer: Uuid,
    filter: &BrowseFilter,
) -> AppResult<Json<ApiResponse<Listing<BrowseCard>>>> {
    let mut cards = views::browse(
        state.store.as_ref(),
        &state.assets,
        viewer,
        filter,
        state.config.browse_limit,
    )?;
    mark_online(&state.redis, &mut cards).await;
    Ok(Json(ApiResponse::ok(Listing::new(cards))))
}

pub async fn browse(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Listing<BrowseCard>>>> {
    browse_with(&state, user.id, &BrowseFilter::default()).await
}

pub async fn browse_filtered(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<BrowseFilter>,
) -> AppResult<Json<ApiResponse<Listing<BrowseCard>>>> {
    browse_with(&state, user.id, &filter).await
}
