use uuid::Uuid;

use rishta_shared::errors::{AppError, AppResult, ErrorCode};
use rishta_shared::types::{Paginated, PaginationParams};

use crate::engine;
use crate::format::{AssetUrls, ConversationView, Directory, MessageView};
use crate::models::{Match, Message, NewMessage};
use crate::store::Store;

pub const MAX_MESSAGE_LEN: usize = 2000;

/// Stores a chat message from `sender` on a mutual match. Returns the message
/// and the member it is addressed to.
pub fn send_message<S: Store + ?Sized>(
    store: &S,
    sender: Uuid,
    match_id: Uuid,
    text: &str,
) -> AppResult<(Message, Uuid)> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "message text is required"));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("message must be at most {MAX_MESSAGE_LEN} characters"),
        ));
    }

    let pair = engine::require_member(store, match_id, sender)?;
    if !pair.is_mutual() {
        return Err(AppError::new(ErrorCode::NotMutualMatch, "you can only message mutual matches"));
    }

    let message = store.insert_message(NewMessage {
        match_id: pair.id,
        sender_id: sender,
        text: text.to_string(),
    })?;
    Ok((message, pair.other(sender)))
}

/// A page of the conversation, oldest first.
pub fn conversation<S: Store + ?Sized>(
    store: &S,
    viewer: Uuid,
    match_id: Uuid,
    page: &PaginationParams,
) -> AppResult<Paginated<MessageView>> {
    engine::require_member(store, match_id, viewer)?;
    let (items, total) = store.messages_for_match(match_id, page)?;
    let items = items.into_iter().map(|m| MessageView::new(m, viewer)).collect();
    Ok(Paginated::new(items, total, page))
}

/// Mutual matches with their latest message, most recent activity first.
pub fn conversations<S: Store + ?Sized>(
    store: &S,
    assets: &AssetUrls,
    viewer: Uuid,
) -> AppResult<Vec<ConversationView>> {
    let pairs: Vec<Match> = store
        .matches_for(viewer)?
        .into_iter()
        .filter(Match::is_mutual)
        .collect();
    let others: Vec<Uuid> = pairs.iter().map(|m| m.other(viewer)).collect();
    let directory = Directory::load(store, &others)?;

    let mut list = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        let Some(other_user) = directory.card(pair.other(viewer), assets) else {
            continue;
        };
        let last_message = store.last_message(pair.id)?;
        let updated_at = last_message
            .as_ref()
            .map_or(pair.updated_at, |m| m.created_at.max(pair.updated_at));
        list.push(ConversationView {
            match_id: pair.id,
            other_user,
            last_message: last_message.map(|m| MessageView::new(m, viewer)),
            updated_at,
        });
    }
    list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(list)
}

/// Only the sender may delete a message.
pub fn delete_message<S: Store + ?Sized>(store: &S, requester: Uuid, message_id: Uuid) -> AppResult<Message> {
    let message = store
        .find_message(message_id)?
        .ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;
    if message.sender_id != requester {
        return Err(AppError::new(ErrorCode::NotMessageSender, "you can only delete your own messages"));
    }
    store.delete_message(message.id)?;
    Ok(message)
}
