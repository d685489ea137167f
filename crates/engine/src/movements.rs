//! Movement primitives.
//!
//! A `Movement` is a single canonical, post-normalization transaction:
//! amounts are unsigned minor units and the sign is implied by the kind.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, SourceKind};

/// Time zone in which user-facing timestamps are interpreted.
///
/// The extractor hands datetimes over as naive `YYYY-MM-DD HH:MM:SS`
/// strings; they are read in this zone and stored as UTC.
pub const REFERENCE_ZONE: Tz = chrono_tz::America::Mexico_City;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Expense,
    Income,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(EngineError::MalformedExtraction(format!(
                "invalid movement kind: {other}"
            ))),
        }
    }
}

/// A canonical movement, ready to be recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    /// The user this movement belongs to. Set by the pipeline, never by
    /// the extractor.
    pub owner: String,
    pub name: String,
    pub description: String,
    pub kind: MovementKind,
    /// Unsigned minor units; `kind` decides whether it adds or subtracts.
    pub amount_minor: i64,
    pub source_name: String,
    pub source_kind: SourceKind,
    pub category: String,
    pub occurred_at: DateTime<Utc>,
}

impl Movement {
    /// Signed ledger effect of this movement.
    pub fn delta_minor(&self) -> i64 {
        match self.kind {
            MovementKind::Expense => -self.amount_minor,
            MovementKind::Income => self.amount_minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub kind: String,
    pub amount_minor: i64,
    pub source_name: String,
    pub source_kind: String,
    pub category: String,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Movement> for ActiveModel {
    fn from(movement: &Movement) -> Self {
        Self {
            id: ActiveValue::Set(movement.id.to_string()),
            owner: ActiveValue::Set(movement.owner.clone()),
            name: ActiveValue::Set(movement.name.clone()),
            description: ActiveValue::Set(movement.description.clone()),
            kind: ActiveValue::Set(movement.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(movement.amount_minor),
            source_name: ActiveValue::Set(movement.source_name.clone()),
            source_kind: ActiveValue::Set(movement.source_kind.as_str().to_string()),
            category: ActiveValue::Set(movement.category.clone()),
            occurred_at: ActiveValue::Set(movement.occurred_at),
        }
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::Ledger("invalid movement id".to_string()))?,
            owner: model.owner,
            name: model.name,
            description: model.description,
            kind: MovementKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            source_name: model.source_name,
            source_kind: SourceKind::try_from(model.source_kind.as_str())?,
            category: model.category,
            occurred_at: model.occurred_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips() {
        for kind in [MovementKind::Expense, MovementKind::Income] {
            assert_eq!(MovementKind::try_from(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_malformed() {
        let err = MovementKind::try_from("transfer").unwrap_err();
        assert!(matches!(err, EngineError::MalformedExtraction(_)));
    }

    #[test]
    fn delta_follows_kind() {
        let mut movement = Movement {
            id: Uuid::new_v4(),
            owner: "alice".to_string(),
            name: "Coffee".to_string(),
            description: String::new(),
            kind: MovementKind::Expense,
            amount_minor: 450,
            source_name: "CASH".to_string(),
            source_kind: SourceKind::Cash,
            category: "FOOD".to_string(),
            occurred_at: chrono::Utc::now(),
        };
        assert_eq!(movement.delta_minor(), -450);
        movement.kind = MovementKind::Income;
        assert_eq!(movement.delta_minor(), 450);
    }
}
