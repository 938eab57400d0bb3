//! Position reconciler: diff a mutated arrangement against its pre-edit
//! snapshot and emit the minimal set of card writes.

use futures_util::future::try_join_all;

use crate::slots::Arrangement;
use crate::store::{RecordStore, StoreError};
use crate::types::{Card, CardId};

/// One deferred persistence action, carrying the full intended field state.
/// Jobs are plain values built after the whole arrangement is computed, so
/// no job can observe a half-edited card.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationJob {
    Save(Card),
    Delete(CardId),
}

impl MutationJob {
    pub fn card_id(&self) -> CardId {
        match self {
            MutationJob::Save(card) => card.id,
            MutationJob::Delete(id) => *id,
        }
    }

    async fn apply(&self, store: &dyn RecordStore) -> Result<(), StoreError> {
        match self {
            MutationJob::Save(card) => store.save_card(card).await,
            MutationJob::Delete(id) => store.delete_card(*id).await,
        }
    }
}

/// Assign `position = slot index + 1` across the arrangement and emit a save
/// for every card whose `(slot, sub-index)` coordinate no longer matches the
/// `original` identifier snapshot.
///
/// The comparison is identity-positional, not content-based: a card that
/// kept the same id at the same coordinate is never rewritten, even when
/// slots shifted around it. Cards with an unchanged coordinate already hold
/// the right position, so skipping them is safe.
pub fn reconcile(arrangement: &mut Arrangement, original: &[Vec<CardId>]) -> Vec<MutationJob> {
    let mut jobs = Vec::new();

    for (i, slot) in arrangement.slots.iter_mut().enumerate() {
        for (j, card) in slot.iter_mut().enumerate() {
            let unchanged = original
                .get(i)
                .and_then(|ids| ids.get(j))
                .copied()
                == Some(card.id);
            if !unchanged {
                card.position = i as i64 + 1;
                jobs.push(MutationJob::Save(card.clone()));
            }
        }
    }

    jobs
}

/// Append a save for `card` unless some job already targets it. Operations
/// use this to guarantee a write for cards the reconciler left untouched
/// (pile reassignments, flag flips) without ever emitting two jobs for one
/// record.
pub(crate) fn ensure_save(jobs: &mut Vec<MutationJob>, card: &Card) {
    if !jobs.iter().any(|job| job.card_id() == card.id) {
        jobs.push(MutationJob::Save(card.clone()));
    }
}

/// Run all jobs concurrently; each targets a distinct card. Fails on the
/// first store error, with no rollback of jobs that already applied.
pub async fn run_jobs(store: &dyn RecordStore, jobs: Vec<MutationJob>) -> Result<(), StoreError> {
    try_join_all(jobs.iter().map(|job| job.apply(store))).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Card;

    fn make_card(id: CardId, position: i64) -> Card {
        Card {
            id,
            column: 1,
            position,
            content: String::new(),
            top_of_pile: false,
        }
    }

    fn arrangement(ids: &[&[CardId]]) -> Arrangement {
        let cards = ids
            .iter()
            .enumerate()
            .flat_map(|(i, slot)| slot.iter().map(move |&id| make_card(id, i as i64 + 1)))
            .collect();
        Arrangement::from_sorted_cards(cards)
    }

    #[test]
    fn test_unchanged_arrangement_emits_nothing() {
        let mut arr = arrangement(&[&[1], &[2, 3], &[4]]);
        let original = arr.slot_map();
        assert!(reconcile(&mut arr, &original).is_empty());
    }

    #[test]
    fn test_writes_follow_coordinate_changes_exactly() {
        // Head card moved to the end shifts every slot index: three writes.
        let mut arr = arrangement(&[&[1], &[2], &[3]]);
        let original = arr.slot_map();
        let card = arr.splice_card(1).unwrap();
        arr.insert_slot(2, vec![card]);
        let jobs = reconcile(&mut arr, &original);
        assert_eq!(jobs.len(), 3);

        // Tail card spliced and reinserted in place: nothing to write.
        let mut arr = arrangement(&[&[1], &[2], &[3]]);
        let original = arr.slot_map();
        let card = arr.splice_card(3).unwrap();
        arr.insert_slot(2, vec![card]);
        assert!(reconcile(&mut arr, &original).is_empty());
    }

    #[test]
    fn test_only_shifted_cards_are_written() {
        let mut arr = arrangement(&[&[1], &[2], &[3], &[4]]);
        let original = arr.slot_map();

        // Remove slot 2 (card 3); slots 0 and 1 keep their coordinates.
        arr.remove_slot(2);

        let jobs = reconcile(&mut arr, &original);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].card_id(), 4);
        match &jobs[0] {
            MutationJob::Save(card) => assert_eq!(card.position, 3),
            other => panic!("unexpected job {:?}", other),
        }
    }

    #[test]
    fn test_sub_index_change_is_a_write() {
        let mut arr = arrangement(&[&[1, 2]]);
        let original = arr.slot_map();

        // Reverse the pile: same slot, different sub-indexes.
        let card = arr.splice_card(1).unwrap();
        arr.slot_mut(0).push(card);

        let jobs = reconcile(&mut arr, &original);
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_ensure_save_skips_already_jobbed_cards() {
        let card = make_card(7, 1);
        let mut jobs = vec![MutationJob::Save(card.clone())];
        ensure_save(&mut jobs, &card);
        assert_eq!(jobs.len(), 1);

        let other = make_card(8, 2);
        ensure_save(&mut jobs, &other);
        assert_eq!(jobs.len(), 2);
    }
}
