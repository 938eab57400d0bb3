pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{Board, BoardId, Card, CardId, Column, ColumnId, UserId, Vote};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Field set for board creation. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewBoard {
    pub title: String,
    pub creator: UserId,
    pub votes_per_user: i64,
    pub p_see_votes: bool,
    pub p_see_content: bool,
    pub p_combine_cards: bool,
    pub p_lock: bool,
}

#[derive(Debug, Clone)]
pub struct NewColumn {
    pub board: BoardId,
    pub title: String,
    pub position: i64,
}

#[derive(Debug, Clone)]
pub struct NewCard {
    pub column: ColumnId,
    pub position: i64,
    pub content: String,
    pub top_of_pile: bool,
}

/// Partial board update; `Some` fields are written, `None` fields are left
/// alone.
#[derive(Debug, Clone, Default)]
pub struct BoardPatch {
    pub title: Option<String>,
    pub votes_per_user: Option<i64>,
    pub p_see_votes: Option<bool>,
    pub p_see_content: Option<bool>,
    pub p_combine_cards: Option<bool>,
    pub p_lock: Option<bool>,
    pub timer_start: Option<DateTime<Utc>>,
    pub timer_length: Option<i64>,
}

/// Record-store contract the engine runs against. Implementations supply
/// per-record reads, filtered-and-sorted finds, creation, full-state saves
/// and deletion; any call may fail with a `StoreError`, which aborts the
/// operation in progress.
///
/// Handles are passed into each engine operation explicitly; the engine
/// keeps no ambient store state.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn read_board(&self, id: BoardId) -> Result<Option<Board>, StoreError>;
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError>;
    async fn create_board(&self, fields: NewBoard) -> Result<Board, StoreError>;
    async fn update_board(
        &self,
        id: BoardId,
        patch: BoardPatch,
    ) -> Result<Option<Board>, StoreError>;

    /// Read a column, scoped to its owning board.
    async fn read_column(
        &self,
        board: BoardId,
        id: ColumnId,
    ) -> Result<Option<Column>, StoreError>;
    /// All columns of a board, position ascending.
    async fn list_columns(&self, board: BoardId) -> Result<Vec<Column>, StoreError>;
    async fn create_column(&self, fields: NewColumn) -> Result<Column, StoreError>;

    async fn read_card(&self, id: CardId) -> Result<Option<Card>, StoreError>;
    /// All cards of a column, position ascending (ties in id order).
    async fn list_column_cards(&self, column: ColumnId) -> Result<Vec<Card>, StoreError>;
    /// The cards sharing one `(column, position)` slot, id descending
    /// (newest first).
    async fn list_cards_at(
        &self,
        column: ColumnId,
        position: i64,
    ) -> Result<Vec<Card>, StoreError>;
    async fn create_card(&self, fields: NewCard) -> Result<Card, StoreError>;
    /// Persist the full current field state of one card.
    async fn save_card(&self, card: &Card) -> Result<(), StoreError>;
    async fn delete_card(&self, id: CardId) -> Result<(), StoreError>;

    /// Votes for any of the given cards.
    async fn list_card_votes(&self, cards: &[CardId]) -> Result<Vec<Vote>, StoreError>;
}
