use std::collections::HashMap;

use futures_util::try_join;

use super::{MoveOutcome, MovePileRequest};
use crate::error::EngineError;
use crate::events::BoardEvent;
use crate::reconcile::{ensure_save, reconcile, run_jobs};
use crate::slots::Arrangement;
use crate::store::RecordStore;
use crate::types::{Card, CardId};

/// Move an entire slot (a pile, possibly of one card) to a new position,
/// same column or across columns.
pub async fn move_pile(
    store: &dyn RecordStore,
    req: MovePileRequest,
) -> Result<MoveOutcome, EngineError> {
    let (source_column, source_stack) = try_join!(
        store.read_column(req.board_id, req.source_column_id),
        store.list_column_cards(req.source_column_id),
    )?;
    source_column.ok_or(EngineError::ColumnNotFound(req.source_column_id))?;

    // A same-column pile move reuses the source arrangement as destination.
    let dest_stack: Option<Vec<Card>> = if req.source_column_id != req.dest_column_id {
        let (dest_column, dest_stack) = try_join!(
            store.read_column(req.board_id, req.dest_column_id),
            store.list_column_cards(req.dest_column_id),
        )?;
        dest_column.ok_or(EngineError::ColumnNotFound(req.dest_column_id))?;
        Some(dest_stack)
    } else {
        None
    };

    let mut source_arr = Arrangement::from_sorted_cards(source_stack);
    let mut dest_arr = dest_stack.map(Arrangement::from_sorted_cards);

    let source_max = source_arr.len() as i64;
    if req.source_position < 1 || req.source_position > source_max {
        return Err(EngineError::PositionOutOfRange {
            position: req.source_position,
            max: source_max,
        });
    }
    let dest_max = dest_arr.as_ref().unwrap_or(&source_arr).len() as i64 + 1;
    if req.dest_position < 1 || req.dest_position > dest_max {
        return Err(EngineError::PositionOutOfRange {
            position: req.dest_position,
            max: dest_max,
        });
    }

    let original_source = source_arr.slot_map();
    let original_dest = dest_arr.as_ref().map(|a| a.slot_map());

    let mut pile = source_arr.remove_slot(req.source_position as usize - 1);

    // Removing the source slot shifts everything after it up by one, so a
    // forward move within a single arrangement lands one index early.
    let extra = if dest_arr.is_none() && req.source_position < req.dest_position {
        1
    } else {
        0
    };

    for card in &mut pile {
        card.column = req.dest_column_id;
        card.position = req.dest_position;
    }
    let pile_ids: Vec<CardId> = pile.iter().map(|c| c.id).collect();

    let insert_at = (req.dest_position - 1 - extra) as usize;
    match dest_arr.as_mut() {
        Some(dest_arr) => dest_arr.insert_slot(insert_at, pile),
        None => source_arr.insert_slot(insert_at, pile),
    }

    let mut jobs = reconcile(&mut source_arr, &original_source);
    if let (Some(dest_arr), Some(original_dest)) = (dest_arr.as_mut(), original_dest.as_ref()) {
        jobs.extend(reconcile(dest_arr, original_dest));
    }

    // Pile cards always move: cover any the reconciler considered in place.
    let landed = dest_arr.as_ref().unwrap_or(&source_arr);
    for id in pile_ids {
        if let Some(card) = landed.card(id) {
            ensure_save(&mut jobs, card);
        }
    }

    run_jobs(store, jobs).await?;

    let mut columns = HashMap::from([(req.source_column_id, source_arr.slot_map())]);
    if let Some(dest_arr) = dest_arr.as_ref() {
        columns.insert(req.dest_column_id, dest_arr.slot_map());
    }

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
    use crate::types::Column;

    async fn setup() -> (MemoryStore, i64, Column, Column) {
        let store = MemoryStore::new();
        let board = seed_board(&store).await;
        let a = seed_column(&store, board.id, "Went Well", 1).await;
        let b = seed_column(&store, board.id, "To Improve", 2).await;
        (store, board.id, a, b)
    }

    #[tokio::test]
    async fn test_same_column_forward_move_compensates_for_removal() {
        let (store, board, col, _) = setup().await;
        let a1 = seed_card(&store, col.id, 1, "a1").await;
        let a2 = seed_card(&store, col.id, 1, "a2").await;
        let b = seed_card(&store, col.id, 2, "b").await;
        let c = seed_card(&store, col.id, 3, "c").await;

        // Pile at slot 1 moved to position 3 of its own column: with the
        // slot removed first, it must land immediately before what was
        // slot index 2 pre-removal.
        let outcome = move_pile(
            &store,
            MovePileRequest {
                board_id: board,
                source_column_id: col.id,
                source_position: 1,
                dest_column_id: col.id,
                dest_position: 3,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            outcome.columns[&col.id],
            vec![vec![b.id], vec![a1.id, a2.id], vec![c.id]]
        );
        assert_eq!(stored_map(&store, col.id).await, outcome.columns[&col.id]);
        assert_contiguous(&store, col.id).await;
    }

    #[tokio::test]
    async fn test_cross_column_pile_move() {
        let (store, board, col, other) = setup().await;
        let a1 = seed_card(&store, col.id, 1, "a1").await;
        let a2 = seed_card(&store, col.id, 1, "a2").await;
        let b = seed_card(&store, col.id, 2, "b").await;
        let x = seed_card(&store, other.id, 1, "x").await;

        let outcome = move_pile(
            &store,
            MovePileRequest {
                board_id: board,
                source_column_id: col.id,
                source_position: 1,
                dest_column_id: other.id,
                dest_position: 2,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.columns[&col.id], vec![vec![b.id]]);
        assert_eq!(
            outcome.columns[&other.id],
            vec![vec![x.id], vec![a1.id, a2.id]]
        );

        // Every pile member was rewritten to the new column, flags intact.
        for id in [a1.id, a2.id] {
            let card = store.read_card(id).await.unwrap().unwrap();
            assert_eq!(card.column, other.id);
            assert_eq!(card.position, 2);
        }
        assert_contiguous(&store, col.id).await;
        assert_contiguous(&store, other.id).await;
    }

    #[tokio::test]
    async fn test_position_bounds() {
        let (store, board, col, other) = setup().await;
        seed_card(&store, col.id, 1, "a").await;
        seed_card(&store, col.id, 2, "b").await;

        // Source position must name an existing slot.
        let err = move_pile(
            &store,
            MovePileRequest {
                board_id: board,
                source_column_id: col.id,
                source_position: 3,
                dest_column_id: other.id,
                dest_position: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::PositionOutOfRange { max: 2, .. }));

        // Destination may append one past the end, but no further.
        let err = move_pile(
            &store,
            MovePileRequest {
                board_id: board,
                source_column_id: col.id,
                source_position: 1,
                dest_column_id: other.id,
                dest_position: 2,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::PositionOutOfRange { max: 1, .. }));
    }

    #[tokio::test]
    async fn test_same_column_noop_move_keeps_order() {
        let (store, board, col, _) = setup().await;
        let a = seed_card(&store, col.id, 1, "a").await;
        let b = seed_card(&store, col.id, 2, "b").await;

        let outcome = move_pile(
            &store,
            MovePileRequest {
                board_id: board,
                source_column_id: col.id,
                source_position: 1,
                dest_column_id: col.id,
                dest_position: 1,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.columns[&col.id], vec![vec![a.id], vec![b.id]]);
        assert_contiguous(&store, col.id).await;
    }

    #[tokio::test]
    async fn test_unknown_columns_are_not_found() {
        let (store, board, col, _) = setup().await;
        seed_card(&store, col.id, 1, "a").await;

        let err = move_pile(
            &store,
            MovePileRequest {
                board_id: board,
                source_column_id: 999,
                source_position: 1,
                dest_column_id: col.id,
                dest_position: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::ColumnNotFound(999)));
    }
}
