use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every domain event published on the bus.
///
/// Routing key format: `rishta.{domain}.{entity}.{action}`
/// Example: `rishta.match.pair.mutual`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

pub mod routing_keys {
    // Accounts
    pub const ACCOUNT_USER_SIGNED_UP: &str = "rishta.account.user.signed_up";
    pub const ACCOUNT_USER_DELETED: &str = "rishta.account.user.deleted";

    // Interests
    pub const INTEREST_SENT: &str = "rishta.interest.request.sent";
    pub const INTEREST_RESPONDED: &str = "rishta.interest.request.responded";

    // Matches
    pub const MATCH_MUTUAL: &str = "rishta.match.pair.mutual";
    pub const MATCH_DISSOLVED: &str = "rishta.match.pair.dissolved";

    // Messaging
    pub const MESSAGE_SENT: &str = "rishta.messaging.message.sent";
    pub const MESSAGE_DELETED: &str = "rishta.messaging.message.deleted";
}

pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserSignedUp {
        pub user_id: Uuid,
        pub email: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserDeleted {
        pub user_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct InterestSent {
        pub interest_id: Uuid,
        pub from_user: Uuid,
        pub to_user: Uuid,
        pub sender_name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct InterestResponded {
        pub interest_id: Uuid,
        pub from_user: Uuid,
        pub to_user: Uuid,
        pub accepted: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MatchMutual {
        pub match_id: Uuid,
        pub user_a: Uuid,
        pub user_b: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MatchDissolved {
        pub match_id: Uuid,
        pub user_a: Uuid,
        pub user_b: Uuid,
        pub reason: String,
    }

    /// Real-time chat delivery. Recipients subscribe through the relay.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MessageSent {
        pub message_id: Uuid,
        pub match_id: Uuid,
        pub sender_id: Uuid,
        pub recipient_id: Uuid,
        pub text: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MessageDeleted {
        pub message_id: Uuid,
        pub match_id: Uuid,
    }
}
