//! Arrangement operations: the editable transformations of a board.
//!
//! Each operation is one request/response transaction. Independent reads are
//! issued together and awaited jointly before any in-memory mutation;
//! mutation jobs are likewise run together and awaited jointly before the
//! outcome (with its broadcast event) is returned. No lock is held across an
//! await, and the store offers no transaction: two concurrent operations on
//! the same column can interleave and produce a position collision or a lost
//! update. The narrow write set computed by the reconciler is the only
//! mitigation; the engine neither detects nor retries that case.
//!
//! A failed read aborts before anything was computed. A failed write aborts
//! with whatever sibling writes already landed kept in place, no broadcast.

mod combine;
mod flip;
mod move_card;
mod move_pile;

pub use combine::{combine_cards, combine_piles};
pub use flip::card_flip;
pub use move_card::move_card;
pub use move_pile::move_pile;

use crate::events::{BoardEvent, ColumnMaps};
use crate::types::{BoardId, Card, CardId, ColumnId};

#[derive(Debug, Clone)]
pub struct MoveCardRequest {
    pub board_id: BoardId,
    pub card_id: CardId,
    pub dest_column_id: ColumnId,
    pub dest_position: i64,
}

#[derive(Debug, Clone)]
pub struct MovePileRequest {
    pub board_id: BoardId,
    pub source_column_id: ColumnId,
    pub source_position: i64,
    pub dest_column_id: ColumnId,
    pub dest_position: i64,
}

#[derive(Debug, Clone)]
pub struct CombineCardsRequest {
    pub board_id: BoardId,
    pub source_card_id: CardId,
    pub dest_card_id: CardId,
}

#[derive(Debug, Clone)]
pub struct CombinePilesRequest {
    pub board_id: BoardId,
    pub source_column_id: ColumnId,
    pub source_position: i64,
    pub dest_card_id: CardId,
}

#[derive(Debug, Clone)]
pub struct CardFlipRequest {
    pub board_id: BoardId,
    pub card_id: CardId,
    pub column_id: ColumnId,
    pub position: i64,
}

/// Outcome of the map-shaped operations (move card/pile, combine piles):
/// the affected columns' flattened maps, which double as the API response
/// body, and the event to broadcast.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub columns: ColumnMaps,
    pub event: BoardEvent,
}

#[derive(Debug, Clone)]
pub struct CombineOutcome {
    pub card: Card,
    pub source_map: Vec<Vec<CardId>>,
    pub source_column_id: ColumnId,
    pub event: BoardEvent,
}

#[derive(Debug, Clone)]
pub struct FlipOutcome {
    pub card_id: CardId,
    pub event: BoardEvent,
}
