//! Replyline server binary.
//!
//! Wires configuration, the database pool, the provider client, and the HTTP
//! router, then serves until shutdown. The provider client is built exactly
//! once here and injected into both orchestrators.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use replyline::adapters::ai::{OpenAiConfig, OpenAiProvider};
use replyline::adapters::http::{api_router, AppState};
use replyline::adapters::postgres::{
    PostgresCallLogRepository, PostgresConversationLogRepository, PostgresPreferenceRepository,
    PostgresSmsLogRepository, PostgresUserRepository,
};
use replyline::application::{
    CompletionClient, CompletionConfig, ConversationService, SmsDecisionService,
};
use replyline::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    info!("starting replyline");

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
    }

    let provider = Arc::new(OpenAiProvider::new(OpenAiConfig::from(&config.ai)));
    let client = Arc::new(CompletionClient::new(
        provider,
        CompletionConfig::from(&config.ai),
    ));

    let state = AppState {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        preferences: Arc::new(PostgresPreferenceRepository::new(pool.clone())),
        conversation_logs: Arc::new(PostgresConversationLogRepository::new(pool.clone())),
        call_logs: Arc::new(PostgresCallLogRepository::new(pool.clone())),
        sms_logs: Arc::new(PostgresSmsLogRepository::new(pool.clone())),
        conversation: Arc::new(ConversationService::new(client.clone())),
        sms_decision: Arc::new(SmsDecisionService::new(client)),
    };

    let cors = build_cors(&config.server.cors_origins_list());

    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown handler");
    }
}
