use crate::store::StoreError;
use crate::types::{BoardId, CardId, ColumnId};

/// Engine failure kinds. The API boundary maps these onto status codes:
/// the `*NotFound` variants to not-found, `PositionOutOfRange`,
/// `SelfCombine` and `MissingCardId` to bad-request, everything else to a
/// server error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    #[error("card not found: {0}")]
    CardNotFound(CardId),

    #[error("position {position} out of range 1..={max}")]
    PositionOutOfRange { position: i64, max: i64 },

    #[error("cannot combine a card with itself")]
    SelfCombine,

    #[error("sourceCardId and destCardId are required")]
    MissingCardId,

    /// A card the arrangement was expected to contain is missing. This is a
    /// caller defect or a concurrent delete, not a validation failure.
    #[error("card {0} missing from its slot arrangement")]
    MissingSlotCard(CardId),

    #[error(transparent)]
    Store(#[from] StoreError),
}
