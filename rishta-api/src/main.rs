use std::sync::Arc;

use rishta_api::config::AppConfig;
use rishta_api::format::AssetUrls;
use rishta_api::store::PgStore;
use rishta_api::AppState;
use rishta_shared::clients::db::create_pool;
use rishta_shared::clients::rabbitmq::RabbitMQClient;
use rishta_shared::clients::redis::RedisClient;
use rishta_shared::types::auth::JwtVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rishta_shared::middleware::init_tracing("rishta-api");

    let config = AppConfig::load()?;
    let port = config.port;
    let metrics = rishta_shared::middleware::init_metrics()?;

    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;

    let state = Arc::new(AppState {
        store: Arc::new(PgStore::new(pool)),
        jwt: JwtVerifier::new(&config.jwt_secret),
        assets: AssetUrls::new(&config.public_base_url),
        config,
        rabbitmq,
        redis,
        metrics,
    });

    let app = rishta_api::router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "rishta-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
