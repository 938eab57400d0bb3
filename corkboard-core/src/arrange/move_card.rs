use std::collections::HashMap;

use futures_util::try_join;

use super::{MoveCardRequest, MoveOutcome};
use crate::error::EngineError;
use crate::events::BoardEvent;
use crate::reconcile::{reconcile, run_jobs, MutationJob};
use crate::slots::Arrangement;
use crate::store::RecordStore;
use crate::types::{Card, Column};

/// Move a single card to a new slot, same column or across columns.
///
/// An empty card headed for the Trash column (position 0) is vaporized:
/// deleted outright instead of repositioned, with its own broadcast event.
pub async fn move_card(
    store: &dyn RecordStore,
    req: MoveCardRequest,
) -> Result<MoveOutcome, EngineError> {
    let (card, dest_column, dest_stack) = try_join!(
        store.read_card(req.card_id),
        store.read_column(req.board_id, req.dest_column_id),
        store.list_column_cards(req.dest_column_id),
    )?;
    let card = card.ok_or(EngineError::CardNotFound(req.card_id))?;
    let dest_column = dest_column.ok_or(EngineError::ColumnNotFound(req.dest_column_id))?;

    // Source loads only when the card is leaving its column; a same-column
    // move already has everything it needs in the destination stack.
    let source: Option<(Column, Vec<Card>)> = if card.column != req.dest_column_id {
        let (source_column, source_stack) = try_join!(
            store.read_column(req.board_id, card.column),
            store.list_column_cards(card.column),
        )?;
        let source_column = source_column.ok_or(EngineError::ColumnNotFound(card.column))?;
        Some((source_column, source_stack))
    } else {
        None
    };

    let mut dest_arr = Arrangement::from_sorted_cards(dest_stack);

    let max = dest_arr.len() as i64 + 1;
    if req.dest_position < 1 || req.dest_position > max {
        return Err(EngineError::PositionOutOfRange {
            position: req.dest_position,
            max,
        });
    }

    // Vaporize: empty card headed for the trash.
    if card.content.is_empty() && dest_column.position == 0 {
        let (source_column_id, mut source_arr) = match source {
            Some((_, source_stack)) => (card.column, Arrangement::from_sorted_cards(source_stack)),
            None => (req.dest_column_id, dest_arr),
        };
        let original = source_arr.slot_map();
        let spliced = source_arr.splice_card(card.id)?;

        log::info!("vaporizing card {} from column {}", spliced.id, source_column_id);

        let mut jobs = vec![MutationJob::Delete(spliced.id)];
        jobs.extend(reconcile(&mut source_arr, &original));
        run_jobs(store, jobs).await?;

        let columns = HashMap::from([(source_column_id, source_arr.slot_map())]);
        return Ok(MoveOutcome {
            columns,
            event: BoardEvent::CardVaporize {
                board_id: req.board_id,
                card_id: card.id,
            },
        });
    }

    let columns = match source {
        // Same column: pull the card out of its slot and reinsert it as a
        // new singleton slot at the requested index.
        None => {
            let original = dest_arr.slot_map();
            let moved = dest_arr.splice_card(card.id)?;
            dest_arr.insert_slot(req.dest_position as usize - 1, vec![moved]);

            let jobs = reconcile(&mut dest_arr, &original);
            run_jobs(store, jobs).await?;

            HashMap::from([(req.dest_column_id, dest_arr.slot_map())])
        }

        // Cross column: splice out of the source arrangement, rewrite the
        // card's column, insert into the destination, reconcile each side
        // against its own snapshot.
        Some((_, source_stack)) => {
            let mut source_arr = Arrangement::from_sorted_cards(source_stack);
            let original_source = source_arr.slot_map();
            let original_dest = dest_arr.slot_map();

            let mut moved = source_arr.splice_card(card.id)?;
            let source_column_id = moved.column;
            moved.column = req.dest_column_id;
            dest_arr.insert_slot(req.dest_position as usize - 1, vec![moved]);

            let mut jobs = reconcile(&mut source_arr, &original_source);
            jobs.extend(reconcile(&mut dest_arr, &original_dest));
            run_jobs(store, jobs).await?;

            HashMap::from([
                (source_column_id, source_arr.slot_map()),
                (req.dest_column_id, dest_arr.slot_map()),
            ])
        }
    };

    Ok(MoveOutcome {
        columns: columns.clone(),
        event: BoardEvent::MoveCards {
            board_id: req.board_id,
            columns,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrange::fixtures::*;
    use crate::store::memory::MemoryStore;

    async fn setup() -> (MemoryStore, i64, i64, i64) {
        let store = MemoryStore::new();
        let board = seed_board(&store).await;
        let trash = seed_column(&store, board.id, "Trash", 0).await;
        let col = seed_column(&store, board.id, "Went Well", 1).await;
        (store, board.id, trash.id, col.id)
    }

    #[tokio::test]
    async fn test_reorder_within_column() {
        let (store, board, _, col) = setup().await;
        let a = seed_card(&store, col, 1, "a").await;
        let b = seed_card(&store, col, 2, "b").await;
        let c = seed_card(&store, col, 3, "c").await;

        let outcome = move_card(
            &store,
            MoveCardRequest {
                board_id: board,
                card_id: a.id,
                dest_column_id: col,
                dest_position: 3,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.columns[&col], vec![vec![b.id], vec![c.id], vec![a.id]]);
        assert_eq!(stored_map(&store, col).await, outcome.columns[&col]);
        assert_contiguous(&store, col).await;
        assert!(matches!(outcome.event, BoardEvent::MoveCards { .. }));
    }

    #[tokio::test]
    async fn test_position_bounds() {
        let (store, board, _, col) = setup().await;
        let a = seed_card(&store, col, 1, "a").await;
        seed_card(&store, col, 2, "b").await;
        seed_card(&store, col, 3, "c").await;

        for bad in [0, 5] {
            let err = move_card(
                &store,
                MoveCardRequest {
                    board_id: board,
                    card_id: a.id,
                    dest_column_id: col,
                    dest_position: bad,
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, EngineError::PositionOutOfRange { .. }));
        }

        // One past the last slot appends.
        let outcome = move_card(
            &store,
            MoveCardRequest {
                board_id: board,
                card_id: a.id,
                dest_column_id: col,
                dest_position: 4,
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.columns[&col].len(), 3);
        assert_eq!(outcome.columns[&col][2], vec![a.id]);
        assert_contiguous(&store, col).await;
    }

    #[tokio::test]
    async fn test_cross_column_move_updates_both_maps() {
        let (store, board, _, col) = setup().await;
        let other = seed_column(&store, board, "To Improve", 2).await;
        let a = seed_card(&store, col, 1, "a").await;
        let b = seed_card(&store, col, 2, "b").await;
        let x = seed_card(&store, other.id, 1, "x").await;

        let outcome = move_card(
            &store,
            MoveCardRequest {
                board_id: board,
                card_id: b.id,
                dest_column_id: other.id,
                dest_position: 1,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.columns[&col], vec![vec![a.id]]);
        assert_eq!(outcome.columns[&other.id], vec![vec![b.id], vec![x.id]]);

        let moved = store.read_card(b.id).await.unwrap().unwrap();
        assert_eq!(moved.column, other.id);
        assert_eq!(moved.position, 1);
        assert_contiguous(&store, col).await;
        assert_contiguous(&store, other.id).await;
    }

    #[tokio::test]
    async fn test_unmoved_neighbors_are_not_rewritten() {
        let (store, board, _, col) = setup().await;
        let a = seed_card(&store, col, 1, "a").await;
        let b = seed_card(&store, col, 2, "b").await;
        let c = seed_card(&store, col, 3, "c").await;

        // Move c onto the tail of its own column: a no-op arrangement.
        move_card(
            &store,
            MoveCardRequest {
                board_id: board,
                card_id: c.id,
                dest_column_id: col,
                dest_position: 3,
            },
        )
        .await
        .unwrap();

        // a and b keep their stored state untouched.
        assert_eq!(store.read_card(a.id).await.unwrap().unwrap().position, 1);
        assert_eq!(store.read_card(b.id).await.unwrap().unwrap().position, 2);
        assert_eq!(stored_map(&store, col).await, vec![vec![a.id], vec![b.id], vec![c.id]]);
    }

    #[tokio::test]
    async fn test_vaporize_empty_card_dropped_into_trash() {
        let (store, board, trash, col) = setup().await;
        let a = seed_card(&store, col, 1, "keep me").await;
        let ghost = seed_card(&store, col, 2, "").await;
        let c = seed_card(&store, col, 3, "also kept").await;

        let outcome = move_card(
            &store,
            MoveCardRequest {
                board_id: board,
                card_id: ghost.id,
                dest_column_id: trash,
                dest_position: 1,
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome.event,
            BoardEvent::CardVaporize { card_id, .. } if card_id == ghost.id
        ));
        assert!(store.read_card(ghost.id).await.unwrap().is_none());
        assert_eq!(outcome.columns[&col], vec![vec![a.id], vec![c.id]]);
        assert_contiguous(&store, col).await;
    }

    #[tokio::test]
    async fn test_nonempty_card_into_trash_moves_normally() {
        let (store, board, trash, col) = setup().await;
        let a = seed_card(&store, col, 1, "still wanted").await;

        let outcome = move_card(
            &store,
            MoveCardRequest {
                board_id: board,
                card_id: a.id,
                dest_column_id: trash,
                dest_position: 1,
            },
        )
        .await
        .unwrap();

        assert!(matches!(outcome.event, BoardEvent::MoveCards { .. }));
        let moved = store.read_card(a.id).await.unwrap().unwrap();
        assert_eq!(moved.column, trash);
    }

    #[tokio::test]
    async fn test_unknown_card_and_column_are_not_found() {
        let (store, board, _, col) = setup().await;
        let a = seed_card(&store, col, 1, "a").await;

        let err = move_card(
            &store,
            MoveCardRequest {
                board_id: board,
                card_id: 999,
                dest_column_id: col,
                dest_position: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::CardNotFound(999)));

        let err = move_card(
            &store,
            MoveCardRequest {
                board_id: board,
                card_id: a.id,
                dest_column_id: 999,
                dest_position: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::ColumnNotFound(999)));
    }
}
