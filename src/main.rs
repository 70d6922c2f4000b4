use std::time::Duration;

use axum::Router;
use quietdesk::{AppState, chats, config::Config, db};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,quietdesk=debug")),
        )
        .init();

    let config = Config::from_env();
    let db_pool = db::connect(&config).await?;
    let state = AppState::new(db_pool, config.clone());

    chats::spawn_retention_sweeper(
        state.store.clone(),
        Duration::from_secs(config.retention_sweep_secs),
    );

    let app = Router::new()
        .nest("/chats", chats::router())
        .with_state(state)
        .layer(CorsLayer::permissive());

    info!(addr = %config.bind_addr, "quietdesk listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
