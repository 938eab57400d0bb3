//! Broadcast events shared between the engine and the serving layer.
//!
//! Every completed operation yields exactly one event. The engine never
//! publishes anything itself; the backend applies the event through a
//! `Publisher` once the operation's writes have all landed, so subscribers
//! only ever see states the store already reflects.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::{Board, BoardId, BoardView, Card, CardId, ColumnId};

/// Column id → flattened per-slot identifier lists; the shape clients use
/// to resync an affected column wholesale.
pub type ColumnMaps = HashMap<ColumnId, Vec<Vec<CardId>>>;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum BoardEvent {
    /// One or two columns were rearranged; payload carries their full maps.
    #[serde(rename = "boardMoveCards", rename_all = "camelCase")]
    MoveCards {
        board_id: BoardId,
        columns: ColumnMaps,
    },

    /// A card joined a pile. Clients derive the new pile membership from
    /// the card's rewritten column/position plus the source column map.
    #[serde(rename = "boardCombineCards", rename_all = "camelCase")]
    CombineCards {
        board_id: BoardId,
        card: Card,
        source_map: Vec<Vec<CardId>>,
        source_column_id: ColumnId,
    },

    /// A different card now shows on top of its pile.
    #[serde(rename = "boardFlipCard", rename_all = "camelCase")]
    FlipCard { board_id: BoardId, card_id: CardId },

    /// An empty card was dropped into Trash and deleted outright.
    #[serde(rename = "cardVaporize", rename_all = "camelCase")]
    CardVaporize { board_id: BoardId, card_id: CardId },

    #[serde(rename = "boardCreated", rename_all = "camelCase")]
    BoardCreated { board: BoardView },

    #[serde(rename = "boardUpdated", rename_all = "camelCase")]
    BoardUpdated { board: Board },

    #[serde(rename = "boardTimerStart", rename_all = "camelCase")]
    TimerStart { board_id: BoardId, seconds: i64 },
}

/// Broadcast adapter: fan one event out to every subscriber of a board.
/// Delivery is fire-and-forget; a lost subscriber is not an operation
/// failure.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, board: BoardId, event: &BoardEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_their_wire_tags() {
        let event = BoardEvent::FlipCard {
            board_id: 1,
            card_id: 9,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "boardFlipCard");
        assert_eq!(json["cardId"], 9);

        let event = BoardEvent::MoveCards {
            board_id: 1,
            columns: ColumnMaps::from([(4, vec![vec![7, 8], vec![9]])]),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "boardMoveCards");
        assert_eq!(json["columns"]["4"][0], serde_json::json!([7, 8]));
    }
}
