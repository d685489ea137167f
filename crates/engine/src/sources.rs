//! Funding sources and their ledger records.
//!
//! A source is a funding instrument (cash, a card, a voucher) with a
//! running balance. One record exists per (owner, name, kind) triple.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Cash,
    DebitCard,
    CreditCard,
    Voucher,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::DebitCard => "debit_card",
            Self::CreditCard => "credit_card",
            Self::Voucher => "voucher",
        }
    }
}

impl TryFrom<&str> for SourceKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "debit_card" => Ok(Self::DebitCard),
            "credit_card" => Ok(Self::CreditCard),
            "voucher" => Ok(Self::Voucher),
            other => Err(EngineError::MalformedExtraction(format!(
                "invalid source kind: {other}"
            ))),
        }
    }
}

/// Ledger record for one funding source.
///
/// `last_digits` is conceptually required for card kinds but not enforced;
/// the chat flow simply never asks for it on cash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub kind: SourceKind,
    pub last_digits: Option<String>,
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner: String,
    pub name: String,
    pub kind: String,
    pub last_digits: Option<String>,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SourceRecord> for ActiveModel {
    fn from(record: &SourceRecord) -> Self {
        Self {
            id: ActiveValue::Set(record.id.to_string()),
            owner: ActiveValue::Set(record.owner.clone()),
            name: ActiveValue::Set(record.name.clone()),
            kind: ActiveValue::Set(record.kind.as_str().to_string()),
            last_digits: ActiveValue::Set(record.last_digits.clone()),
            balance_minor: ActiveValue::Set(record.balance_minor),
            created_at: ActiveValue::Set(record.created_at),
        }
    }
}

impl TryFrom<Model> for SourceRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::Ledger("invalid source id".to_string()))?,
            owner: model.owner,
            name: model.name,
            kind: SourceKind::try_from(model.kind.as_str())?,
            last_digits: model.last_digits,
            balance_minor: model.balance_minor,
            created_at: model.created_at,
        })
    }
}
