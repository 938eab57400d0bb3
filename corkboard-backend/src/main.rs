//! corkboard-backend: serving shell for the board arrangement engine.

use std::sync::Arc;

use corkboard_core::store::memory::MemoryStore;

mod api;
mod config;
mod server;
mod state;
mod ws;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::from_env();
    let store = Arc::new(MemoryStore::new());
    let state = state::AppState::new(store, config.port);

    if let Err(e) = server::run(state, &config).await {
        log::error!("server exited with error: {}", e);
        std::process::exit(1);
    }
}
