//! The normalizer: raw extraction in, canonical movement out.
//!
//! Order matters and each step fails independently: coerce, validate
//! fields, check the category/kind invariant, complete the timestamp, then
//! register category and source. Registration happens inside one DB
//! transaction and is idempotent; a store failure propagates so a movement
//! is never accepted without its side effects applied.

use chrono::{NaiveDateTime, TimeZone, Utc};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    Candidate, EngineError, INCOME_CATEGORY, Movement, MovementKind, REFERENCE_ZONE, ResultEngine,
    SourceKind,
};

use super::{Engine, taxonomy, with_tx};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name and kind a source defaults to when the extraction omits them.
const DEFAULT_SOURCE_NAME: &str = "CASH";

/// Validates a candidate and completes it into a canonical movement.
///
/// Pure: no store access. Taxonomy registration is the caller's job.
fn build_movement(candidate: Candidate, owner: &str) -> ResultEngine<Movement> {
    let name = candidate
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| EngineError::MalformedExtraction("missing movement name".to_string()))?;

    let kind = candidate
        .movement_type
        .ok_or_else(|| EngineError::MalformedExtraction("missing movement type".to_string()))
        .and_then(|raw| MovementKind::try_from(raw.to_ascii_lowercase().as_str()))?;

    let amount = candidate
        .amount
        .ok_or_else(|| EngineError::MalformedExtraction("missing amount".to_string()))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(EngineError::MalformedExtraction(format!(
            "amount must be a non-negative number, got {amount}"
        )));
    }
    let amount_minor = (amount * 100.0).round() as i64;

    let category = candidate
        .category
        .ok_or_else(|| EngineError::MalformedExtraction("missing category".to_string()))?
        .to_uppercase();

    // Hard validation, not auto-correction: an income movement must carry
    // the income label.
    if kind == MovementKind::Income && category != INCOME_CATEGORY {
        return Err(EngineError::CategoryMovementMismatch(category));
    }

    let source_name = candidate
        .source_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string())
        .to_uppercase();

    let source_kind = match candidate.source_type {
        Some(raw) => SourceKind::try_from(raw.to_ascii_lowercase().as_str())?,
        None => SourceKind::Cash,
    };

    let occurred_at = match candidate.datetime {
        Some(raw) => {
            let naive = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
                .map_err(|_| EngineError::MalformedExtraction(format!("invalid datetime: {raw}")))?;
            REFERENCE_ZONE
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| {
                    EngineError::MalformedExtraction(format!(
                        "datetime does not exist in the reference zone: {raw}"
                    ))
                })?
                .with_timezone(&Utc)
        }
        None => Utc::now(),
    };

    Ok(Movement {
        id: Uuid::new_v4(),
        owner: owner.to_string(),
        name,
        description: candidate.description.unwrap_or_default(),
        kind,
        amount_minor,
        source_name,
        source_kind,
        category,
        occurred_at,
    })
}

impl Engine {
    /// Normalizes a raw extracted record for `owner`.
    ///
    /// On success the referenced category (expense only) and source are
    /// guaranteed to exist in the store; a fresh source opens at balance 0
    /// and only moves once the movement is recorded. Re-normalizing known
    /// labels writes nothing.
    pub async fn normalize(&self, raw: serde_json::Value, owner: &str) -> ResultEngine<Movement> {
        let candidate = Candidate::from_value(raw)?;
        let movement = build_movement(candidate, owner)?;

        with_tx!(self, |tx| {
            // Income never registers a category; its label is fixed.
            if movement.kind == MovementKind::Expense {
                let inserted = taxonomy::ensure_category(&tx, owner, &movement.category).await?;
                if inserted {
                    tracing::info!("new category added for {owner}: {}", movement.category);
                }
            }

            let created = taxonomy::ensure_source(
                &tx,
                owner,
                &movement.source_name,
                movement.source_kind,
                0,
                None,
            )
            .await?;
            if created {
                tracing::info!(
                    "new source added for {owner}: {} ({})",
                    movement.source_name,
                    movement.source_kind.as_str()
                );
            }

            Ok(movement)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn coffee() -> Candidate {
        Candidate::from_value(json!({
            "name": "Coffee",
            "description": "flat white",
            "movement_type": "expense",
            "amount": 4.5,
            "source_name": "cash",
            "source_type": "cash",
            "category": "food",
        }))
        .unwrap()
    }

    #[test]
    fn labels_are_canonicalized_upper_case() {
        let movement = build_movement(coffee(), "alice").unwrap();

        assert_eq!(movement.owner, "alice");
        assert_eq!(movement.category, "FOOD");
        assert_eq!(movement.source_name, "CASH");
        assert_eq!(movement.amount_minor, 450);
        assert_eq!(movement.kind, MovementKind::Expense);
    }

    #[test]
    fn income_with_foreign_category_fails() {
        let mut candidate = coffee();
        candidate.movement_type = Some("income".to_string());
        candidate.category = Some("bonus".to_string());

        let err = build_movement(candidate, "alice").unwrap_err();
        assert_eq!(err, EngineError::CategoryMovementMismatch("BONUS".to_string()));
    }

    #[test]
    fn income_with_income_category_passes() {
        let mut candidate = coffee();
        candidate.movement_type = Some("Income".to_string());
        candidate.category = Some("income".to_string());

        let movement = build_movement(candidate, "alice").unwrap();
        assert_eq!(movement.kind, MovementKind::Income);
        assert_eq!(movement.category, INCOME_CATEGORY);
    }

    #[test]
    fn provided_datetime_is_read_in_the_reference_zone() {
        let mut candidate = coffee();
        candidate.datetime = Some("2026-03-01 12:00:00".to_string());

        let movement = build_movement(candidate, "alice").unwrap();
        // Mexico City is UTC-6 in March.
        assert_eq!(
            movement.occurred_at,
            Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_datetime_is_filled_with_now() {
        let before = Utc::now();
        let movement = build_movement(coffee(), "alice").unwrap();
        assert!(movement.occurred_at >= before);
        assert!(movement.occurred_at <= Utc::now());
    }

    #[test]
    fn invalid_datetime_is_malformed() {
        let mut candidate = coffee();
        candidate.datetime = Some("yesterday at noon".to_string());

        assert!(matches!(
            build_movement(candidate, "alice"),
            Err(EngineError::MalformedExtraction(_))
        ));
    }

    #[test]
    fn negative_amount_is_malformed() {
        let mut candidate = coffee();
        candidate.amount = Some(-4.5);

        assert!(matches!(
            build_movement(candidate, "alice"),
            Err(EngineError::MalformedExtraction(_))
        ));
    }

    #[test]
    fn zero_amount_is_legal() {
        let mut candidate = coffee();
        candidate.amount = Some(0.0);

        let movement = build_movement(candidate, "alice").unwrap();
        assert_eq!(movement.amount_minor, 0);
    }

    #[test]
    fn missing_source_defaults_to_cash() {
        let mut candidate = coffee();
        candidate.source_name = None;
        candidate.source_type = None;

        let movement = build_movement(candidate, "alice").unwrap();
        assert_eq!(movement.source_name, "CASH");
        assert_eq!(movement.source_kind, SourceKind::Cash);
    }

    #[test]
    fn missing_name_is_malformed() {
        let mut candidate = coffee();
        candidate.name = Some("   ".to_string());

        assert!(matches!(
            build_movement(candidate, "alice"),
            Err(EngineError::MalformedExtraction(_))
        ));
    }
}
