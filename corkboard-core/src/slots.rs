//! Slot model: a column's cards viewed as an ordered sequence of slots.
//!
//! Grouping a position-sorted card list means that
//!
//!   [{.., position: 1}, {.., position: 1}, {.., position: 2}]
//!
//! becomes
//!
//!   [[{.., position: 1}, {.., position: 1}], [{.., position: 2}]]
//!
//! A slot with more than one card is a pile. Slot index + 1 is the position
//! every member of the slot should hold once reconciled.

use crate::error::EngineError;
use crate::types::{Card, CardId};

/// One column's cards grouped into slots. Purely in-memory; rebuilt from the
/// store on every operation and discarded afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arrangement {
    pub(crate) slots: Vec<Vec<Card>>,
}

impl Arrangement {
    /// Group a card list sorted by ascending position into consecutive
    /// same-position runs, preserving input order within each run.
    pub fn from_sorted_cards(cards: Vec<Card>) -> Self {
        let mut slots: Vec<Vec<Card>> = Vec::new();
        let mut buffer: Vec<Card> = Vec::new();

        for card in cards {
            if let Some(first) = buffer.first() {
                if card.position != first.position {
                    slots.push(std::mem::take(&mut buffer));
                }
            }
            buffer.push(card);
        }
        if !buffer.is_empty() {
            slots.push(buffer);
        }

        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Vec<Card>] {
        &self.slots
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut Vec<Card> {
        &mut self.slots[index]
    }

    /// Insert a slot at `index`; an index past the last slot appends.
    pub fn insert_slot(&mut self, index: usize, slot: Vec<Card>) {
        let index = index.min(self.slots.len());
        self.slots.insert(index, slot);
    }

    /// Remove and return the whole slot (pile) at `index`. Callers validate
    /// the index against `len()` first.
    pub fn remove_slot(&mut self, index: usize) -> Vec<Card> {
        self.slots.remove(index)
    }

    /// Remove and return the card with the given id, dropping its slot if it
    /// was the only member.
    pub fn splice_card(&mut self, id: CardId) -> Result<Card, EngineError> {
        for x in 0..self.slots.len() {
            if let Some(y) = self.slots[x].iter().position(|c| c.id == id) {
                let card = self.slots[x].remove(y);
                if self.slots[x].is_empty() {
                    self.slots.remove(x);
                }
                return Ok(card);
            }
        }
        Err(EngineError::MissingSlotCard(id))
    }

    /// Find a card anywhere in the arrangement.
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.slots.iter().flatten().find(|c| c.id == id)
    }

    /// The per-slot identifier lists: the shape clients sync on, and the
    /// snapshot the reconciler diffs against.
    pub fn slot_map(&self) -> Vec<Vec<CardId>> {
        self.slots
            .iter()
            .map(|slot| slot.iter().map(|c| c.id).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_card(id: CardId, position: i64) -> Card {
        Card {
            id,
            column: 1,
            position,
            content: format!("card {}", id),
            top_of_pile: false,
        }
    }

    #[test]
    fn test_group_runs_into_slots() {
        let arr = Arrangement::from_sorted_cards(vec![
            make_card(1, 1),
            make_card(2, 1),
            make_card(3, 2),
        ]);
        assert_eq!(arr.slot_map(), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_group_empty_input() {
        let arr = Arrangement::from_sorted_cards(Vec::new());
        assert!(arr.is_empty());
        assert!(arr.slot_map().is_empty());
    }

    #[test]
    fn test_group_round_trips_against_naive_grouping() {
        let cards = vec![
            make_card(10, 1),
            make_card(11, 2),
            make_card(12, 2),
            make_card(13, 2),
            make_card(14, 3),
        ];

        // Naive reference: bucket ids by position value, in order.
        let mut reference: Vec<Vec<CardId>> = Vec::new();
        let mut last_position = None;
        for card in &cards {
            if last_position != Some(card.position) {
                reference.push(Vec::new());
                last_position = Some(card.position);
            }
            reference.last_mut().unwrap().push(card.id);
        }

        let arr = Arrangement::from_sorted_cards(cards);
        assert_eq!(arr.slot_map(), reference);
    }

    #[test]
    fn test_splice_removes_card_and_keeps_pile() {
        let mut arr = Arrangement::from_sorted_cards(vec![
            make_card(1, 1),
            make_card(2, 1),
            make_card(3, 2),
        ]);
        let card = arr.splice_card(2).unwrap();
        assert_eq!(card.id, 2);
        assert_eq!(arr.slot_map(), vec![vec![1], vec![3]]);
    }

    #[test]
    fn test_splice_drops_emptied_slot() {
        let mut arr =
            Arrangement::from_sorted_cards(vec![make_card(1, 1), make_card(2, 2)]);
        arr.splice_card(1).unwrap();
        assert_eq!(arr.slot_map(), vec![vec![2]]);
    }

    #[test]
    fn test_splice_unknown_card_is_an_inconsistency() {
        let mut arr = Arrangement::from_sorted_cards(vec![make_card(1, 1)]);
        assert!(matches!(
            arr.splice_card(99),
            Err(EngineError::MissingSlotCard(99))
        ));
    }

    #[test]
    fn test_insert_slot_past_end_appends() {
        let mut arr = Arrangement::from_sorted_cards(vec![make_card(1, 1)]);
        arr.insert_slot(5, vec![make_card(2, 9)]);
        assert_eq!(arr.slot_map(), vec![vec![1], vec![2]]);
    }
}
