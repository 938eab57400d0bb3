//! WebSocket board rooms.
//!
//! Clients open `GET /boards/{board_id}/ws` and receive every broadcast
//! event for that board as tagged JSON. The socket is subscribe-only; the
//! read side exists just to notice the close.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use corkboard_core::events::{BoardEvent, Publisher};
use corkboard_core::types::BoardId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::state::AppState;

// ── BoardHub ────────────────────────────────────────────────────────────────

struct BoardRoom {
    clients: HashMap<u64, mpsc::UnboundedSender<String>>,
    next_peer_id: u64,
}

impl BoardRoom {
    fn new() -> Self {
        Self {
            clients: HashMap::new(),
            next_peer_id: 1,
        }
    }
}

pub struct BoardHub {
    rooms: HashMap<BoardId, BoardRoom>,
}

impl BoardHub {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Register a new subscriber for a board room. Returns (peer_id, receiver).
    fn register(&mut self, board_id: BoardId) -> (u64, mpsc::UnboundedReceiver<String>) {
        let room = self.rooms.entry(board_id).or_insert_with(BoardRoom::new);
        let peer_id = room.next_peer_id;
        room.next_peer_id += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        room.clients.insert(peer_id, tx);
        (peer_id, rx)
    }

    /// Unregister a subscriber, dropping the room once it empties.
    fn unregister(&mut self, board_id: BoardId, peer_id: u64) {
        if let Some(room) = self.rooms.get_mut(&board_id) {
            room.clients.remove(&peer_id);
            if room.clients.is_empty() {
                self.rooms.remove(&board_id);
            }
        }
    }

    /// Push a JSON message to every subscriber of a board.
    pub fn broadcast(&self, board_id: BoardId, msg: &str) {
        if let Some(room) = self.rooms.get(&board_id) {
            for tx in room.clients.values() {
                let _ = tx.send(msg.to_string());
            }
        }
    }
}

/// Broadcast adapter over the room hub plus the global SSE channel.
pub struct EventFanout {
    pub hub: Arc<Mutex<BoardHub>>,
    pub event_tx: broadcast::Sender<BoardEvent>,
}

#[async_trait]
impl Publisher for EventFanout {
    async fn publish(&self, board: BoardId, event: &BoardEvent) {
        match serde_json::to_string(event) {
            Ok(msg) => {
                let hub = self.hub.lock().await;
                hub.broadcast(board, &msg);
            }
            Err(e) => log::error!("[ws] failed to encode event for board {}: {}", board, e),
        }
        // SSE subscribers get the same event; no receivers is fine.
        let _ = self.event_tx.send(event.clone());
    }
}

// ── Router + handler ────────────────────────────────────────────────────────

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/boards/{board_id}/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(board_id): Path<BoardId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_subscriber(socket, board_id, state))
}

async fn handle_subscriber(socket: WebSocket, board_id: BoardId, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (peer_id, mut room_rx) = {
        let mut hub = state.hub.lock().await;
        hub.register(board_id)
    };

    log::info!("[ws] peer {} subscribed to board {}", peer_id, board_id);

    // Write task: forward room messages to the socket.
    let write_task = tokio::spawn(async move {
        while let Some(msg) = room_rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Read task: drain until the client closes.
    let read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    // Whichever task finishes first, abort the other to prevent leaks.
    let mut write_task = write_task;
    let mut read_task = read_task;
    tokio::select! {
        _ = &mut write_task => { read_task.abort(); }
        _ = &mut read_task => { write_task.abort(); }
    }

    let mut hub = state.hub.lock().await;
    hub.unregister(board_id, peer_id);
    log::info!("[ws] peer {} left board {}", peer_id, board_id);
}
