use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use rishta_shared::clients::rabbitmq::RabbitMQClient;
use rishta_shared::clients::redis::RedisClient;
use rishta_shared::types::auth::{HasJwtVerifier, JwtVerifier};

pub mod config;
pub mod engine;
pub mod events;
pub mod format;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;
pub mod views;

use config::AppConfig;
use format::AssetUrls;
use store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: AppConfig,
    pub jwt: JwtVerifier,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub assets: AssetUrls,
    pub metrics: PrometheusHandle,
}

impl HasJwtVerifier for AppState {
    fn jwt_verifier(&self) -> &JwtVerifier {
        &self.jwt
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let interest = Router::new()
        .route("/", post(routes::interest::send_interest))
        .route("/:id", delete(routes::interest::cancel_interest))
        .route("/:id/accept", put(routes::interest::accept_interest))
        .route("/:id/reject", put(routes::interest::reject_interest))
        .route("/notifications", get(routes::interest::notifications))
        .route("/notifications/unread-count", get(routes::interest::unread_count))
        .route("/sent", get(routes::interest::sent_interests))
        .route("/shortlist", get(routes::interest::shortlist))
        .route("/shortlist/add", post(routes::interest::shortlist_add))
        .route("/shortlist/remove", post(routes::interest::shortlist_remove));

    let matches = Router::new()
        .route("/", get(routes::matches::my_matches))
        .route("/interest/:id", post(routes::matches::express_interest))
        .route("/friends", get(routes::matches::friends))
        .route("/requests", get(routes::matches::pending_requests))
        .route("/sent", get(routes::matches::sent_requests))
        .route("/browse", get(routes::matches::browse))
        .route("/browse/filter", get(routes::matches::browse_filtered))
        .route("/:id", delete(routes::matches::delete_conversation))
        .route("/:id/remove-interest", put(routes::matches::remove_interest))
        .route("/:id/unfriend", put(routes::matches::unfriend));

    let messages = Router::new()
        .route("/", post(routes::messages::send_message))
        .route("/conversations", get(routes::messages::conversations))
        .route(
            "/:id",
            get(routes::messages::list_messages).delete(routes::messages::delete_message),
        );

    let settings = Router::new()
        .route("/", get(routes::settings::get_settings))
        .route(
            "/account",
            put(routes::settings::update_account).delete(routes::settings::delete_account),
        )
        .route("/password", put(routes::settings::change_password))
        .route("/privacy", put(routes::settings::update_privacy))
        .route("/notifications", put(routes::settings::update_notifications))
        .route("/active", put(routes::settings::set_active));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/accounts/signup", post(routes::accounts::signup))
        .route("/presence/heartbeat", post(routes::presence::heartbeat))
        .route("/profile", post(routes::profile::save_profile))
        .route(
            "/profile/me",
            get(routes::profile::get_profile)
                .put(routes::profile::update_profile)
                .delete(routes::profile::delete_profile),
        )
        .route("/profile/approved", get(routes::profile::approved_profiles))
        .route("/profile/:id/status", put(routes::profile::update_profile_status))
        .nest("/interest", interest)
        .nest("/match", matches)
        .nest("/messages", messages)
        .nest("/settings", settings)
        .layer(middleware::from_fn(rishta_shared::middleware::metrics_middleware))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
