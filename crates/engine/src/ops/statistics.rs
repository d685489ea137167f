//! Read-side queries over the movement log: history and totals.

use sea_orm::{QueryFilter, QueryOrder, QuerySelect, Statement, prelude::*};

use crate::{Movement, MovementKind, ResultEngine, movements};

use super::Engine;

impl Engine {
    /// Lists the owner's most recent movements, newest first.
    pub async fn recent_movements(&self, owner: &str, limit: u64) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .filter(movements::Column::Owner.eq(owner))
            .order_by_desc(movements::Column::OccurredAt)
            .limit(limit)
            .all(&self.database)
            .await?;

        models.into_iter().map(Movement::try_from).collect()
    }

    /// Returns `(total_income_minor, total_expenses_minor)` over the log.
    pub async fn totals(&self, owner: &str) -> ResultEngine<(i64, i64)> {
        let backend = self.database.get_database_backend();

        let mut sums = [0i64; 2];
        for (slot, kind) in sums
            .iter_mut()
            .zip([MovementKind::Income, MovementKind::Expense])
        {
            let stmt = Statement::from_sql_and_values(
                backend,
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM movements \
                 WHERE owner = ? AND kind = ?",
                [owner.into(), kind.as_str().into()],
            );
            let row = self.database.query_one(stmt).await?;
            *slot = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);
        }

        Ok((sums[0], sums[1]))
    }
}
