use super::{CardFlipRequest, FlipOutcome};
use crate::error::EngineError;
use crate::events::BoardEvent;
use crate::reconcile::{run_jobs, MutationJob};
use crate::store::RecordStore;

/// Put a different card on top of its pile. At most two cards change state:
/// the previous top loses its flag, the named card gains it. Geometry is
/// untouched.
pub async fn card_flip(
    store: &dyn RecordStore,
    req: CardFlipRequest,
) -> Result<FlipOutcome, EngineError> {
    let cards = store.list_cards_at(req.column_id, req.position).await?;

    let mut jobs = Vec::new();
    for mut card in cards {
        if card.top_of_pile && card.id != req.card_id {
            card.top_of_pile = false;
            jobs.push(MutationJob::Save(card));
        } else if !card.top_of_pile && card.id == req.card_id {
            card.top_of_pile = true;
            jobs.push(MutationJob::Save(card));
        }
    }
    run_jobs(store, jobs).await?;

    Ok(FlipOutcome {
        card_id: req.card_id,
        event: BoardEvent::FlipCard {
            board_id: req.board_id,
            card_id: req.card_id,
        },
    })
}
