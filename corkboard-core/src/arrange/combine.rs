//! Combine operations: stack a card onto another card, or merge a whole
//! pile into an existing slot.
//!
//! When source and destination share a column and the source sat strictly
//! above the destination, removing the source's slot collapses the column by
//! one, so the destination position is decremented to compensate. For a
//! single card that only applies when the card was alone in its slot; a pile
//! member leaves its slot behind.

use std::collections::HashMap;

use futures_util::try_join;

use super::{CombineCardsRequest, CombineOutcome, CombinePilesRequest, MoveOutcome};
use crate::error::EngineError;
use crate::events::BoardEvent;
use crate::reconcile::{ensure_save, reconcile, run_jobs, MutationJob};
use crate::slots::Arrangement;
use crate::store::RecordStore;
use crate::types::CardId;

/// Combine one card into another, forming or extending a pile. The arriving
/// card becomes the pile top; stale top flags at the destination slot are
/// cleared.
pub async fn combine_cards(
    store: &dyn RecordStore,
    req: CombineCardsRequest,
) -> Result<CombineOutcome, EngineError> {
    if req.source_card_id == req.dest_card_id {
        return Err(EngineError::SelfCombine);
    }
    if req.source_card_id == 0 || req.dest_card_id == 0 {
        return Err(EngineError::MissingCardId);
    }

    let (board, source, dest) = try_join!(
        store.read_board(req.board_id),
        store.read_card(req.source_card_id),
        store.read_card(req.dest_card_id),
    )?;
    board.ok_or(EngineError::BoardNotFound(req.board_id))?;
    let source = source.ok_or(EngineError::CardNotFound(req.source_card_id))?;
    let dest = dest.ok_or(EngineError::CardNotFound(req.dest_card_id))?;

    let (source_column, source_stack, dest_column, dest_pile) = try_join!(
        store.read_column(req.board_id, source.column),
        store.list_column_cards(source.column),
        store.read_column(req.board_id, dest.column),
        store.list_cards_at(dest.column, dest.position),
    )?;
    source_column.ok_or(EngineError::ColumnNotFound(source.column))?;
    dest_column.ok_or(EngineError::ColumnNotFound(dest.column))?;

    let source_column_id = source.column;
    let source_position = source.position;

    let mut source_arr = Arrangement::from_sorted_cards(source_stack);
    let original_source = source_arr.slot_map();

    // Whether the dragged card came out of a pile, checked before the
    // splice collapses anything.
    let source_is_pile = source_arr
        .slots()
        .get((source_position - 1) as usize)
        .map_or(false, |slot| slot.len() > 1);

    let mut moving = source_arr.splice_card(source.id)?;

    let mut dest_position = dest.position;
    if source_column_id == dest.column && source_position < dest.position && !source_is_pile {
        dest_position -= 1;
    }

    moving.column = dest.column;
    moving.position = dest_position;
    moving.top_of_pile = true;
    let moving_id = moving.id;

    if source_column_id == dest.column {
        // The destination slot sits at the adjusted index now that the
        // source slot is gone; everything happens inside the one
        // arrangement so every job carries reconciled state.
        let idx = (dest_position - 1) as usize;
        let holds_dest = source_arr
            .slots()
            .get(idx)
            .map_or(false, |slot| slot.iter().any(|c| c.id == dest.id));
        if !holds_dest {
            return Err(EngineError::MissingSlotCard(dest.id));
        }

        let mut flipped: Vec<CardId> = Vec::new();
        for card in source_arr.slot_mut(idx) {
            if card.top_of_pile {
                card.top_of_pile = false;
                flipped.push(card.id);
            }
        }
        source_arr.slot_mut(idx).push(moving);

        let mut jobs = reconcile(&mut source_arr, &original_source);
        for id in flipped.into_iter().chain([moving_id]) {
            if let Some(card) = source_arr.card(id) {
                ensure_save(&mut jobs, card);
            }
        }
        run_jobs(store, jobs).await?;

        let card = source_arr
            .card(moving_id)
            .cloned()
            .ok_or(EngineError::MissingSlotCard(moving_id))?;
        let source_map = source_arr.slot_map();
        Ok(CombineOutcome {
            event: BoardEvent::CombineCards {
                board_id: req.board_id,
                card: card.clone(),
                source_map: source_map.clone(),
                source_column_id,
            },
            card,
            source_map,
            source_column_id,
        })
    } else {
        let mut jobs = reconcile(&mut source_arr, &original_source);
        jobs.push(MutationJob::Save(moving.clone()));

        // The destination pile was loaded separately; its cards keep their
        // coordinates, only stale top flags flip.
        for mut card in dest_pile {
            if card.top_of_pile {
                card.top_of_pile = false;
                jobs.push(MutationJob::Save(card));
            }
        }
        run_jobs(store, jobs).await?;

        let source_map = source_arr.slot_map();
        Ok(CombineOutcome {
            event: BoardEvent::CombineCards {
                board_id: req.board_id,
                card: moving.clone(),
                source_map: source_map.clone(),
                source_column_id,
            },
            card: moving,
            source_map,
            source_column_id,
        })
    }
}

/// Merge an entire pile into the slot of an existing card. The moving pile
/// keeps its own top card; the destination slot's stale flags are cleared.
pub async fn combine_piles(
    store: &dyn RecordStore,
    req: CombinePilesRequest,
) -> Result<MoveOutcome, EngineError> {
    let (dest, source_stack) = try_join!(
        store.read_card(req.dest_card_id),
        store.list_column_cards(req.source_column_id),
    )?;
    let dest = dest.ok_or(EngineError::CardNotFound(req.dest_card_id))?;
    let dest_stack = store.list_column_cards(dest.column).await?;

    let same_column = req.source_column_id == dest.column;

    let mut source_arr = Arrangement::from_sorted_cards(source_stack);
    let original_source = source_arr.slot_map();

    let source_max = source_arr.len() as i64;
    if req.source_position < 1 || req.source_position > source_max {
        return Err(EngineError::PositionOutOfRange {
            position: req.source_position,
            max: source_max,
        });
    }

    let mut dest_position = dest.position;
    if same_column && req.source_position < dest.position {
        dest_position -= 1;
    }

    let mut pile = source_arr.remove_slot((req.source_position - 1) as usize);
    for card in &mut pile {
        card.column = dest.column;
        card.position = dest_position;
    }
    let pile_ids: Vec<CardId> = pile.iter().map(|c| c.id).collect();

    let columns = if same_column {
        // The destination stack is the same data; work on the source view
        // so every write carries reconciled positions.
        let idx = (dest_position - 1) as usize;
        let holds_dest = source_arr
            .slots()
            .get(idx)
            .map_or(false, |slot| slot.iter().any(|c| c.id == dest.id));
        if !holds_dest {
            return Err(EngineError::MissingSlotCard(dest.id));
        }

        let mut flipped: Vec<CardId> = Vec::new();
        for card in source_arr.slot_mut(idx) {
            if card.top_of_pile {
                card.top_of_pile = false;
                flipped.push(card.id);
            }
        }
        source_arr.slot_mut(idx).extend(pile);

        let mut jobs = reconcile(&mut source_arr, &original_source);
        for id in flipped.into_iter().chain(pile_ids) {
            if let Some(card) = source_arr.card(id) {
                ensure_save(&mut jobs, card);
            }
        }
        run_jobs(store, jobs).await?;

        HashMap::from([(dest.column, source_arr.slot_map())])
    } else {
        let mut dest_arr = Arrangement::from_sorted_cards(dest_stack);
        let idx = (dest.position - 1) as usize;
        let holds_dest = dest_arr
            .slots()
            .get(idx)
            .map_or(false, |slot| slot.iter().any(|c| c.id == dest.id));
        if !holds_dest {
            return Err(EngineError::MissingSlotCard(dest.id));
        }

        let mut jobs: Vec<MutationJob> = Vec::new();
        for card in dest_arr.slot_mut(idx) {
            if card.top_of_pile {
                card.top_of_pile = false;
                jobs.push(MutationJob::Save(card.clone()));
            }
        }
        dest_arr.slot_mut(idx).extend(pile);

        jobs.extend(reconcile(&mut source_arr, &original_source));
        for id in pile_ids {
            if let Some(card) = dest_arr.card(id) {
                ensure_save(&mut jobs, card);
            }
        }
        run_jobs(store, jobs).await?;

        HashMap::from([
            (dest.column, dest_arr.slot_map()),
            (req.source_column_id, source_arr.slot_map()),
        ])
    };

    Ok(MoveOutcome {
        columns: columns.clone(),
        event: BoardEvent::MoveCards {
            board_id: req.board_id,
            columns,
        },
    })
}
