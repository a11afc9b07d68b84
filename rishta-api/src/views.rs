//! Read-side projections of interests and matches for one viewer.

use serde::Deserialize;
use uuid::Uuid;

use rishta_shared::errors::{AppError, AppResult, ErrorCode};

use crate::format::{
    AssetUrls, BrowseCard, Directory, MatchView, Notification, NotificationFeed, SentInterest,
};
use crate::models::Match;
use crate::store::{BrowseQuery, Store};

/// Optional browse facets, as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseFilter {
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub religion: Option<String>,
    pub location: Option<String>,
    pub education: Option<String>,
    pub profession: Option<String>,
}

fn facet(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn project<S, F>(
    store: &S,
    assets: &AssetUrls,
    viewer: Uuid,
    keep: F,
) -> AppResult<Vec<MatchView>>
where
    S: Store + ?Sized,
    F: Fn(&Match) -> bool,
{
    let pairs: Vec<Match> = store.matches_for(viewer)?.into_iter().filter(|m| keep(m)).collect();
    let others: Vec<Uuid> = pairs.iter().map(|m| m.other(viewer)).collect();
    let directory = Directory::load(store, &others)?;

    Ok(pairs
        .iter()
        .filter_map(|m| {
            let card = directory.card(m.other(viewer), assets)?;
            Some(MatchView::new(m, viewer, card))
        })
        .collect())
}

/// Every match the viewer belongs to.
pub fn my_matches<S: Store + ?Sized>(store: &S, assets: &AssetUrls, viewer: Uuid) -> AppResult<Vec<MatchView>> {
    project(store, assets, viewer, |_| true)
}

pub fn friends<S: Store + ?Sized>(store: &S, assets: &AssetUrls, viewer: Uuid) -> AppResult<Vec<MatchView>> {
    project(store, assets, viewer, Match::is_mutual)
}

/// One-sided matches waiting on the viewer.
pub fn pending_requests<S: Store + ?Sized>(
    store: &S,
    assets: &AssetUrls,
    viewer: Uuid,
) -> AppResult<Vec<MatchView>> {
    project(store, assets, viewer, |m| m.is_request_for(viewer))
}

/// One-sided matches the viewer started.
pub fn sent_requests<S: Store + ?Sized>(
    store: &S,
    assets: &AssetUrls,
    viewer: Uuid,
) -> AppResult<Vec<MatchView>> {
    project(store, assets, viewer, |m| m.has_sent(viewer) && !m.is_mutual())
}

/// Candidate profiles for the viewer: active users other than the viewer and
/// their friends, admitted by the viewer's gender preference and `filter`.
pub fn browse<S: Store + ?Sized>(
    store: &S,
    assets: &AssetUrls,
    viewer: Uuid,
    filter: &BrowseFilter,
    limit: i64,
) -> AppResult<Vec<BrowseCard>> {
    let profile = store.find_profile_by_user(viewer)?.ok_or_else(|| {
        AppError::new(ErrorCode::ProfileIncomplete, "please complete your profile first")
    })?;

    let friends = store
        .matches_for(viewer)?
        .into_iter()
        .filter(Match::is_mutual)
        .map(|m| m.other(viewer))
        .collect();

    let query = BrowseQuery {
        viewer,
        gender: profile.gender_preference.target_gender(profile.gender),
        exclude_users: friends,
        min_age: filter.min_age,
        max_age: filter.max_age,
        muslim_only: facet(&filter.religion).is_some_and(|r| r.eq_ignore_ascii_case("muslim")),
        city: facet(&filter.location),
        education: facet(&filter.education),
        profession: facet(&filter.profession),
        limit,
    };

    let pool = store.browse_profiles(&query)?;
    tracing::debug!(viewer = %viewer, candidates = pool.len(), "browse pool built");
    Ok(pool.iter().map(|p| BrowseCard::new(p, assets)).collect())
}

/// Received interests, newest first, each with its sender's card.
pub fn notifications<S: Store + ?Sized>(
    store: &S,
    assets: &AssetUrls,
    viewer: Uuid,
) -> AppResult<NotificationFeed> {
    let received = store.interests_to(viewer)?;
    let senders: Vec<Uuid> = received.iter().map(|i| i.from_user).collect();
    let directory = Directory::load(store, &senders)?;

    let notifications: Vec<Notification> = received
        .iter()
        .filter_map(|i| Some(Notification::new(i, directory.card(i.from_user, assets)?)))
        .collect();
    let unread_count = notifications.iter().filter(|n| !n.read).count();

    Ok(NotificationFeed { notifications, unread_count })
}

pub fn sent_interests<S: Store + ?Sized>(
    store: &S,
    assets: &AssetUrls,
    viewer: Uuid,
) -> AppResult<Vec<SentInterest>> {
    let sent = store.interests_from(viewer)?;
    let receivers: Vec<Uuid> = sent.iter().map(|i| i.to_user).collect();
    let directory = Directory::load(store, &receivers)?;

    Ok(sent
        .iter()
        .filter_map(|i| {
            Some(SentInterest {
                id: i.id,
                status: i.status,
                to: directory.card(i.to_user, assets)?,
                created_at: i.created_at,
            })
        })
        .collect())
}
