use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use rishta_shared::clients::redis::RedisClient;
use rishta_shared::errors::AppResult;
use rishta_shared::types::auth::AuthUser;
use rishta_shared::types::ApiResponse;

use crate::format::Presence;
use crate::AppState;

pub fn presence_key(user_id: Uuid) -> String {
    format!("online:{user_id}")
}

/// Fills the online flag of each item from presence keys. Lookup failures
/// leave everyone offline.
pub async fn mark_online<T: Presence>(redis: &RedisClient, items: &mut [T]) {
    let keys: Vec<String> = items.iter().map(|i| presence_key(i.presence_user())).collect();
    match redis.exists_multi(&keys).await {
        Ok(flags) => {
            for (item, online) in items.iter_mut().zip(flags) {
                item.set_online(online);
            }
        }
        Err(e) => tracing::warn!(error = %e, "presence lookup failed"),
    }
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub online: bool,
    pub ttl_secs: u64,
}

/// POST /presence/heartbeat
pub async fn heartbeat(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<HeartbeatResponse>>> {
    let ttl_secs = state.config.presence_ttl_secs;
    let online = match state.redis.set(&presence_key(user.id), "1", ttl_secs).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user.id, "failed to refresh presence");
            false
        }
    };
    state.store.touch_profile(user.id)?;

    Ok(Json(ApiResponse::ok(HeartbeatResponse { online, ttl_secs })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_key_format() {
        let id = Uuid::nil();
        assert_eq!(presence_key(id), "online:00000000-0000-0000-0000-000000000000");
    }
}
