//! In-memory record store.
//!
//! Backs the server binary and the test suite. Tables live behind one
//! RwLock; ids come from a single monotonic counter shared by all record
//! types, so no two records of any type ever collide.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{BoardPatch, NewBoard, NewCard, NewColumn, RecordStore, StoreError};
use crate::types::{Board, BoardId, Card, CardId, Column, ColumnId, UserId, Vote, VoteId};

#[derive(Debug, Default)]
struct Tables {
    boards: HashMap<BoardId, Board>,
    columns: HashMap<ColumnId, Column>,
    cards: HashMap<CardId, Card>,
    votes: HashMap<VoteId, Vote>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a vote directly. Vote casting happens outside the engine; this
    /// exists so tests and seeds can provide vote context for board loads.
    pub fn add_vote(&self, user: UserId, card: CardId) -> Vote {
        let vote = Vote {
            id: self.next_id(),
            user,
            card,
        };
        self.tables
            .write()
            .unwrap()
            .votes
            .insert(vote.id, vote.clone());
        vote
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read_board(&self, id: BoardId) -> Result<Option<Board>, StoreError> {
        Ok(self.tables.read().unwrap().boards.get(&id).cloned())
    }

    async fn list_boards(&self) -> Result<Vec<Board>, StoreError> {
        let tables = self.tables.read().unwrap();
        let mut boards: Vec<Board> = tables.boards.values().cloned().collect();
        boards.sort_by_key(|b| b.id);
        Ok(boards)
    }

    async fn create_board(&self, fields: NewBoard) -> Result<Board, StoreError> {
        let board = Board {
            id: self.next_id(),
            title: fields.title,
            creator: fields.creator,
            votes_per_user: fields.votes_per_user,
            timer_length: None,
            timer_start: None,
            p_see_votes: fields.p_see_votes,
            p_see_content: fields.p_see_content,
            p_combine_cards: fields.p_combine_cards,
            p_lock: fields.p_lock,
        };
        self.tables
            .write()
            .unwrap()
            .boards
            .insert(board.id, board.clone());
        Ok(board)
    }

    async fn update_board(
        &self,
        id: BoardId,
        patch: BoardPatch,
    ) -> Result<Option<Board>, StoreError> {
        let mut tables = self.tables.write().unwrap();
        let Some(board) = tables.boards.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            board.title = title;
        }
        if let Some(votes_per_user) = patch.votes_per_user {
            board.votes_per_user = votes_per_user;
        }
        if let Some(v) = patch.p_see_votes {
            board.p_see_votes = v;
        }
        if let Some(v) = patch.p_see_content {
            board.p_see_content = v;
        }
        if let Some(v) = patch.p_combine_cards {
            board.p_combine_cards = v;
        }
        if let Some(v) = patch.p_lock {
            board.p_lock = v;
        }
        if let Some(start) = patch.timer_start {
            board.timer_start = Some(start);
        }
        if let Some(length) = patch.timer_length {
            board.timer_length = Some(length);
        }
        Ok(Some(board.clone()))
    }

    async fn read_column(
        &self,
        board: BoardId,
        id: ColumnId,
    ) -> Result<Option<Column>, StoreError> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .columns
            .get(&id)
            .filter(|c| c.board == board)
            .cloned())
    }

    async fn list_columns(&self, board: BoardId) -> Result<Vec<Column>, StoreError> {
        let tables = self.tables.read().unwrap();
        let mut columns: Vec<Column> = tables
            .columns
            .values()
            .filter(|c| c.board == board)
            .cloned()
            .collect();
        columns.sort_by_key(|c| (c.position, c.id));
        Ok(columns)
    }

    async fn create_column(&self, fields: NewColumn) -> Result<Column, StoreError> {
        let column = Column {
            id: self.next_id(),
            board: fields.board,
            title: fields.title,
            position: fields.position,
        };
        self.tables
            .write()
            .unwrap()
            .columns
            .insert(column.id, column.clone());
        Ok(column)
    }

    async fn read_card(&self, id: CardId) -> Result<Option<Card>, StoreError> {
        Ok(self.tables.read().unwrap().cards.get(&id).cloned())
    }

    async fn list_column_cards(&self, column: ColumnId) -> Result<Vec<Card>, StoreError> {
        let tables = self.tables.read().unwrap();
        let mut cards: Vec<Card> = tables
            .cards
            .values()
            .filter(|c| c.column == column)
            .cloned()
            .collect();
        cards.sort_by_key(|c| (c.position, c.id));
        Ok(cards)
    }

    async fn list_cards_at(
        &self,
        column: ColumnId,
        position: i64,
    ) -> Result<Vec<Card>, StoreError> {
        let tables = self.tables.read().unwrap();
        let mut cards: Vec<Card> = tables
            .cards
            .values()
            .filter(|c| c.column == column && c.position == position)
            .cloned()
            .collect();
        cards.sort_by_key(|c| std::cmp::Reverse(c.id));
        Ok(cards)
    }

    async fn create_card(&self, fields: NewCard) -> Result<Card, StoreError> {
        let card = Card {
            id: self.next_id(),
            column: fields.column,
            position: fields.position,
            content: fields.content,
            top_of_pile: fields.top_of_pile,
        };
        self.tables
            .write()
            .unwrap()
            .cards
            .insert(card.id, card.clone());
        Ok(card)
    }

    async fn save_card(&self, card: &Card) -> Result<(), StoreError> {
        self.tables
            .write()
            .unwrap()
            .cards
            .insert(card.id, card.clone());
        Ok(())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), StoreError> {
        self.tables.write().unwrap().cards.remove(&id);
        Ok(())
    }

    async fn list_card_votes(&self, cards: &[CardId]) -> Result<Vec<Vote>, StoreError> {
        let tables = self.tables.read().unwrap();
        let mut votes: Vec<Vote> = tables
            .votes
            .values()
            .filter(|v| cards.contains(&v.card))
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.id);
        Ok(votes)
    }
}
