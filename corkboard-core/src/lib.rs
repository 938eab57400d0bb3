//! corkboard-core: the board arrangement engine.
//!
//! A board is a set of ordered columns; each column holds cards at dense
//! 1-based positions, with position ties denoting piles. This crate owns the
//! slot model, the position reconciler, and the arrangement operations
//! (move/combine/flip/vaporize), plus the record-store contract they run
//! against and the broadcast events they produce. Transport and HTTP live in
//! corkboard-backend.

pub mod arrange;
pub mod boards;
pub mod error;
pub mod events;
pub mod reconcile;
pub mod slots;
pub mod store;
pub mod types;

pub use error::EngineError;
