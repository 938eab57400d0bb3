//! Board lifecycle: creation with starter columns, full loads, config
//! updates and the shared timer. Cards and votes are created elsewhere;
//! these operations only assemble and reconfigure.

use std::collections::HashMap;

use chrono::Utc;
use futures_util::future::try_join_all;

use crate::error::EngineError;
use crate::store::{BoardPatch, NewBoard, NewColumn, RecordStore};
use crate::types::{
    Board, BoardId, BoardSummary, BoardView, CardId, CardView, ColumnView, Vote,
};

/// A named starter column layout. Position 0 is always the Trash column,
/// added in front of whichever set is chosen.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSet {
    pub id: i64,
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const COLUMN_SETS: &[ColumnSet] = &[
    ColumnSet {
        id: 1,
        name: "Retrospective",
        columns: &["Went Well", "To Improve", "Action Items"],
    },
    ColumnSet {
        id: 2,
        name: "Kanban",
        columns: &["To Do", "Doing", "Done"],
    },
];

fn column_set(id: i64) -> &'static ColumnSet {
    COLUMN_SETS.iter().find(|s| s.id == id).unwrap_or(&COLUMN_SETS[0])
}

#[derive(Debug, Clone)]
pub struct CreateBoardRequest {
    pub title: String,
    pub creator: i64,
    pub colset_id: i64,
    pub votes_per_user: i64,
    pub p_see_votes: bool,
    pub p_see_content: bool,
    pub p_combine_cards: bool,
    pub p_lock: bool,
}

/// Create a board with its starter columns: Trash at position 0, then the
/// chosen set at positions 1..N. Column creations run concurrently.
pub async fn create_board(
    store: &dyn RecordStore,
    req: CreateBoardRequest,
) -> Result<BoardView, EngineError> {
    let board = store
        .create_board(NewBoard {
            title: req.title,
            creator: req.creator,
            votes_per_user: req.votes_per_user,
            p_see_votes: req.p_see_votes,
            p_see_content: req.p_see_content,
            p_combine_cards: req.p_combine_cards,
            p_lock: req.p_lock,
        })
        .await?;

    let set = column_set(req.colset_id);
    let mut jobs = vec![store.create_column(NewColumn {
        board: board.id,
        title: "Trash".into(),
        position: 0,
    })];
    for (i, title) in set.columns.iter().enumerate() {
        jobs.push(store.create_column(NewColumn {
            board: board.id,
            title: (*title).into(),
            position: i as i64 + 1,
        }));
    }
    let mut columns = try_join_all(jobs).await?;
    columns.sort_by_key(|c| c.position);

    let timer_left = board.timer_left(Utc::now());
    Ok(BoardView {
        board,
        timer_left,
        columns: columns
            .into_iter()
            .map(|column| ColumnView {
                column,
                cards: Vec::new(),
            })
            .collect(),
    })
}

/// Assemble the whole board: columns in position order, each column's cards
/// in position order, each card's votes attached.
pub async fn load_full(store: &dyn RecordStore, id: BoardId) -> Result<BoardView, EngineError> {
    let board = store
        .read_board(id)
        .await?
        .ok_or(EngineError::BoardNotFound(id))?;
    let columns = store.list_columns(id).await?;

    let card_lists =
        try_join_all(columns.iter().map(|c| store.list_column_cards(c.id))).await?;

    let all_ids: Vec<CardId> = card_lists.iter().flatten().map(|c| c.id).collect();
    let votes = store.list_card_votes(&all_ids).await?;
    let mut votes_by_card: HashMap<CardId, Vec<Vote>> = HashMap::new();
    for vote in votes {
        votes_by_card.entry(vote.card).or_default().push(vote);
    }

    let timer_left = board.timer_left(Utc::now());
    Ok(BoardView {
        board,
        timer_left,
        columns: columns
            .into_iter()
            .zip(card_lists)
            .map(|(column, cards)| ColumnView {
                column,
                cards: cards
                    .into_iter()
                    .map(|card| CardView {
                        votes: votes_by_card.remove(&card.id).unwrap_or_default(),
                        card,
                    })
                    .collect(),
            })
            .collect(),
    })
}

pub async fn list_boards(store: &dyn RecordStore) -> Result<Vec<BoardSummary>, EngineError> {
    let boards = store.list_boards().await?;
    Ok(boards
        .into_iter()
        .map(|b| BoardSummary {
            id: b.id,
            title: b.title,
        })
        .collect())
}

pub async fn update_board(
    store: &dyn RecordStore,
    id: BoardId,
    patch: BoardPatch,
) -> Result<Board, EngineError> {
    store
        .update_board(id, patch)
        .await?
        .ok_or(EngineError::BoardNotFound(id))
}

/// Start (or restart) the shared countdown timer.
pub async fn start_timer(
    store: &dyn RecordStore,
    id: BoardId,
    seconds: i64,
) -> Result<Board, EngineError> {
    let patch = BoardPatch {
        timer_start: Some(Utc::now()),
        timer_length: Some(seconds),
        ..BoardPatch::default()
    };
    store
        .update_board(id, patch)
        .await?
        .ok_or(EngineError::BoardNotFound(id))
}
