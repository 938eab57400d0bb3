use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type BoardId = i64;
pub type ColumnId = i64;
pub type CardId = i64;
pub type UserId = i64;
pub type VoteId = i64;

/// A card on the board. `position` is 1-based and dense within a column;
/// cards sharing a position form a pile. Empty `content` marks an unused
/// placeholder that vaporizes when dropped into the Trash column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub column: ColumnId,
    pub position: i64,
    pub content: String,
    pub top_of_pile: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub board: BoardId,
    pub title: String,
    /// 0 is the special Trash column; working columns start at 1.
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub creator: UserId,
    pub votes_per_user: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_start: Option<DateTime<Utc>>,
    pub p_see_votes: bool,
    pub p_see_content: bool,
    pub p_combine_cards: bool,
    pub p_lock: bool,
}

impl Board {
    /// Seconds remaining on the board timer at `now`. Zero when no timer has
    /// been started; negative once a started timer has run out.
    pub fn timer_left(&self, now: DateTime<Utc>) -> i64 {
        match (self.timer_start, self.timer_length) {
            (Some(start), Some(length)) => length - (now - start).num_seconds(),
            _ => 0,
        }
    }
}

/// A vote is a "+1" for a card. Vote casting is handled outside the engine;
/// votes appear here only as read-only context on full board loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: VoteId,
    pub user: UserId,
    pub card: CardId,
}

/// Summary info for a board in list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub id: BoardId,
    pub title: String,
}

/// A fully assembled board: columns in position order, cards in position
/// order under their columns, votes under their cards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub timer_left: i64,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: Column,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    #[serde(flatten)]
    pub card: Card,
    pub votes: Vec<Vote>,
}
