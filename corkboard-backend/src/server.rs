//! HTTP server: assemble the routers and serve.

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::api_router;
use crate::config::ServerConfig;
use crate::state::AppState;
use crate::ws::ws_router;

pub async fn run(state: AppState, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app: Router = api_router().merge(ws_router()).layer(cors).with_state(state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.bind_address, config.port)).await?;

    log::info!(
        "corkboard listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
