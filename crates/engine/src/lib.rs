//! Core pipeline for the finance chat assistant.
//!
//! The engine turns a raw extracted record into a canonical [`Movement`]
//! (validating it and registering its category/source on the way), and on
//! user confirmation applies the movement to the source ledger and appends
//! it to the movement log. All data is partitioned by owner.

pub use error::EngineError;
pub use extraction::Candidate;
pub use movements::{Movement, MovementKind, REFERENCE_ZONE};
pub use ops::{Engine, EngineBuilder};
pub use sources::{SourceKind, SourceRecord};

mod categories;
mod error;
mod extraction;
mod movements;
mod ops;
mod sources;

type ResultEngine<T> = Result<T, EngineError>;

/// Canonical category label for income movements.
pub const INCOME_CATEGORY: &str = "INCOME";
