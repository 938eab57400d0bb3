//! Shared application state passed to axum handlers.

use std::sync::Arc;

use corkboard_core::events::{BoardEvent, Publisher};
use corkboard_core::store::memory::MemoryStore;
use tokio::sync::{broadcast, Mutex};

use crate::ws::{BoardHub, EventFanout};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub hub: Arc<Mutex<BoardHub>>,
    pub event_tx: broadcast::Sender<BoardEvent>,
    pub publisher: Arc<dyn Publisher>,
    pub port: u16,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>, port: u16) -> Self {
        let hub = Arc::new(Mutex::new(BoardHub::new()));
        let (event_tx, _) = broadcast::channel(256);
        let publisher = Arc::new(EventFanout {
            hub: hub.clone(),
            event_tx: event_tx.clone(),
        });
        Self {
            store,
            hub,
            event_tx,
            publisher,
            port,
        }
    }
}
