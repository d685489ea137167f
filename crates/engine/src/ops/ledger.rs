//! Ledger updates and the append-only movement log.
//!
//! The balance adjustment is a single `balance = balance + delta` UPDATE,
//! so two concurrent applies for the same source always accumulate instead
//! of racing on a read-modify-write.

use sea_orm::{ConnectionTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{EngineError, Movement, ResultEngine, SourceRecord, movements, sources};

use super::{Engine, taxonomy, with_tx};

async fn apply_with<C>(db: &C, movement: &Movement) -> ResultEngine<SourceRecord>
where
    C: ConnectionTrait,
{
    let delta = movement.delta_minor();

    // Zero-amount movements are legal and issue no write at all.
    if delta != 0 {
        let result = sources::Entity::update_many()
            .col_expr(
                sources::Column::BalanceMinor,
                Expr::col(sources::Column::BalanceMinor).add(delta),
            )
            .filter(sources::Column::Owner.eq(&movement.owner))
            .filter(sources::Column::Name.eq(&movement.source_name))
            .filter(sources::Column::Kind.eq(movement.source_kind.as_str()))
            .exec(db)
            .await?;

        match result.rows_affected {
            0 => return Err(EngineError::UnknownSource(movement.source_name.clone())),
            1 => {}
            n => {
                return Err(EngineError::Ledger(format!(
                    "balance update touched {n} rows for {}",
                    movement.source_name
                )));
            }
        }
    }

    let model = taxonomy::find_source(db, &movement.owner, &movement.source_name, movement.source_kind)
        .await?
        .ok_or_else(|| EngineError::UnknownSource(movement.source_name.clone()))?;

    SourceRecord::try_from(model)
}

async fn log_with<C>(db: &C, movement: &Movement) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    movements::ActiveModel::from(movement).insert(db).await?;
    Ok(())
}

impl Engine {
    /// Applies a movement's monetary effect to its source record.
    ///
    /// A source the normalizer did not register is a pipeline desync and
    /// surfaces as `UnknownSource`; nothing is written in that case.
    pub async fn apply(&self, movement: &Movement) -> ResultEngine<SourceRecord> {
        with_tx!(self, |tx| apply_with(&tx, movement).await)
    }

    /// Appends a movement to the log. Pure append; no update, no delete.
    pub async fn log_movement(&self, movement: &Movement) -> ResultEngine<()> {
        log_with(&self.database, movement).await
    }

    /// Records an accepted movement: ledger apply plus log append in one
    /// database transaction.
    ///
    /// Called only after explicit user confirmation. Taxonomy rows created
    /// during normalization are independent of this call and stay in place
    /// if the user rejects the movement instead.
    pub async fn record(&self, movement: &Movement) -> ResultEngine<SourceRecord> {
        with_tx!(self, |tx| {
            let record = apply_with(&tx, movement).await?;
            log_with(&tx, movement).await?;
            tracing::info!(
                "movement recorded for {}: {} {}",
                movement.owner,
                movement.name,
                movement.amount_minor
            );
            Ok(record)
        })
    }
}
