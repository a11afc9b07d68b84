//! Fire-and-forget domain events. A failed publish is logged and never
//! surfaces to the caller.

use serde::Serialize;
use uuid::Uuid;

use rishta_shared::clients::rabbitmq::RabbitMQClient;
use rishta_shared::types::event::{payloads, routing_keys, Event};

const SOURCE: &str = "rishta-api";

async fn emit<T: Serialize>(rabbitmq: &RabbitMQClient, routing_key: &str, actor: Uuid, data: T) {
    let event = Event::new(SOURCE, routing_key, data).with_user(actor);
    if let Err(e) = rabbitmq.publish(routing_key, &event).await {
        tracing::error!(error = %e, routing_key, "failed to publish event");
    }
}

pub async fn publish_user_signed_up(rabbitmq: &RabbitMQClient, user_id: Uuid, email: &str) {
    let data = payloads::UserSignedUp { user_id, email: email.to_string() };
    emit(rabbitmq, routing_keys::ACCOUNT_USER_SIGNED_UP, user_id, data).await;
}

pub async fn publish_user_deleted(rabbitmq: &RabbitMQClient, user_id: Uuid) {
    let data = payloads::UserDeleted { user_id };
    emit(rabbitmq, routing_keys::ACCOUNT_USER_DELETED, user_id, data).await;
}

pub async fn publish_interest_sent(
    rabbitmq: &RabbitMQClient,
    interest_id: Uuid,
    from_user: Uuid,
    to_user: Uuid,
    sender_name: &str,
) {
    let data = payloads::InterestSent {
        interest_id,
        from_user,
        to_user,
        sender_name: sender_name.to_string(),
    };
    emit(rabbitmq, routing_keys::INTEREST_SENT, from_user, data).await;
}

pub async fn publish_interest_responded(
    rabbitmq: &RabbitMQClient,
    interest_id: Uuid,
    from_user: Uuid,
    to_user: Uuid,
    accepted: bool,
) {
    let data = payloads::InterestResponded { interest_id, from_user, to_user, accepted };
    emit(rabbitmq, routing_keys::INTEREST_RESPONDED, to_user, data).await;
}

pub async fn publish_match_mutual(rabbitmq: &RabbitMQClient, match_id: Uuid, user_a: Uuid, user_b: Uuid) {
    let data = payloads::MatchMutual { match_id, user_a, user_b };
    emit(rabbitmq, routing_keys::MATCH_MUTUAL, user_a, data).await;
}

pub async fn publish_match_dissolved(
    rabbitmq: &RabbitMQClient,
    match_id: Uuid,
    [user_a, user_b]: [Uuid; 2],
    actor: Uuid,
    reason: &str,
) {
    let data = payloads::MatchDissolved { match_id, user_a, user_b, reason: reason.to_string() };
    emit(rabbitmq, routing_keys::MATCH_DISSOLVED, actor, data).await;
}

pub async fn publish_message_sent(
    rabbitmq: &RabbitMQClient,
    message_id: Uuid,
    match_id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    text: &str,
) {
    let data = payloads::MessageSent {
        message_id,
        match_id,
        sender_id,
        recipient_id,
        text: text.to_string(),
    };
    emit(rabbitmq, routing_keys::MESSAGE_SENT, sender_id, data).await;
}

pub async fn publish_message_deleted(rabbitmq: &RabbitMQClient, message_id: Uuid, match_id: Uuid, actor: Uuid) {
    let data = payloads::MessageDeleted { message_id, match_id };
    emit(rabbitmq, routing_keys::MESSAGE_DELETED, actor, data).await;
}
