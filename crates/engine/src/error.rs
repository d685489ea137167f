//! The module contains the errors the engine can throw.
//!
//! Every failure surfaces as an explicit value. Nothing in the engine logs
//! an error and continues: a movement is either fully processed or the
//! caller gets an [`EngineError`].
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The extracted record could not be coerced into a usable candidate.
    #[error("malformed extraction: {0}")]
    MalformedExtraction(String),
    /// An income movement carried a category other than the income label.
    #[error("category does not match movement kind: {0}")]
    CategoryMovementMismatch(String),
    /// The ledger holds no record for the referenced source.
    #[error("\"{0}\" source not found!")]
    UnknownSource(String),
    /// Explicit wallet creation hit an already-registered source.
    #[error("\"{0}\" already present!")]
    ExistingSource(String),
    /// A ledger write touched an unexpected number of rows.
    #[error("ledger write failed: {0}")]
    Ledger(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MalformedExtraction(a), Self::MalformedExtraction(b)) => a == b,
            (Self::CategoryMovementMismatch(a), Self::CategoryMovementMismatch(b)) => a == b,
            (Self::UnknownSource(a), Self::UnknownSource(b)) => a == b,
            (Self::ExistingSource(a), Self::ExistingSource(b)) => a == b,
            (Self::Ledger(a), Self::Ledger(b)) => a == b,
            (Self::StoreUnavailable(a), Self::StoreUnavailable(b)) => {
                a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}
