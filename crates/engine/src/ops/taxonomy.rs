//! Per-owner taxonomy: known categories and funding sources.
//!
//! "Ensure known" is expressed as a conditional insert against the unique
//! index, so concurrent normalizations of the same label cannot race: the
//! loser of the insert simply affects zero rows.

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, SourceKind, SourceRecord, categories, sources};

use super::{Engine, with_tx};

/// Registers a category for the owner if it is not already known.
///
/// Returns whether a row was inserted. Comparison is exact-string on the
/// caller's upper-cased label; internal whitespace is left alone.
pub(super) async fn ensure_category<C>(db: &C, owner: &str, name: &str) -> ResultEngine<bool>
where
    C: ConnectionTrait,
{
    let category = categories::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        owner: ActiveValue::Set(owner.to_string()),
        name: ActiveValue::Set(name.to_string()),
    };

    let inserted = categories::Entity::insert(category)
        .on_conflict(
            OnConflict::columns([categories::Column::Owner, categories::Column::Name])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(inserted > 0)
}

/// Registers a source for the owner if no (name, kind) record exists yet.
///
/// Returns whether a row was inserted.
pub(super) async fn ensure_source<C>(
    db: &C,
    owner: &str,
    name: &str,
    kind: SourceKind,
    opening_balance_minor: i64,
    last_digits: Option<&str>,
) -> ResultEngine<bool>
where
    C: ConnectionTrait,
{
    let source = sources::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        owner: ActiveValue::Set(owner.to_string()),
        name: ActiveValue::Set(name.to_string()),
        kind: ActiveValue::Set(kind.as_str().to_string()),
        last_digits: ActiveValue::Set(last_digits.map(|digits| digits.to_string())),
        balance_minor: ActiveValue::Set(opening_balance_minor),
        created_at: ActiveValue::Set(Utc::now()),
    };

    let inserted = sources::Entity::insert(source)
        .on_conflict(
            OnConflict::columns([
                sources::Column::Owner,
                sources::Column::Name,
                sources::Column::Kind,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(inserted > 0)
}

pub(super) async fn find_source<C>(
    db: &C,
    owner: &str,
    name: &str,
    kind: SourceKind,
) -> ResultEngine<Option<sources::Model>>
where
    C: ConnectionTrait,
{
    sources::Entity::find()
        .filter(sources::Column::Owner.eq(owner))
        .filter(sources::Column::Name.eq(name))
        .filter(sources::Column::Kind.eq(kind.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

impl Engine {
    /// Adds a wallet entry with a user-chosen opening balance.
    ///
    /// The name is canonicalized to upper case like the normalizer does.
    /// An already-registered (name, kind) pair is an error instead of a
    /// silent duplicate.
    pub async fn create_source(
        &self,
        owner: &str,
        name: &str,
        kind: SourceKind,
        last_digits: Option<&str>,
        opening_balance_minor: i64,
    ) -> ResultEngine<SourceRecord> {
        let canonical = name.to_uppercase();

        with_tx!(self, |tx| {
            let created = ensure_source(
                &tx,
                owner,
                &canonical,
                kind,
                opening_balance_minor,
                last_digits,
            )
            .await?;

            if !created {
                Err(EngineError::ExistingSource(canonical.clone()))
            } else {
                tracing::info!("new source added for {owner}: {canonical} ({})", kind.as_str());
                let model = find_source(&tx, owner, &canonical, kind).await?.ok_or_else(|| {
                    EngineError::Ledger("source vanished after insert".to_string())
                })?;
                SourceRecord::try_from(model)
            }
        })
    }

    /// Returns one source record.
    pub async fn source(
        &self,
        owner: &str,
        name: &str,
        kind: SourceKind,
    ) -> ResultEngine<SourceRecord> {
        let model = find_source(&self.database, owner, name, kind)
            .await?
            .ok_or_else(|| EngineError::UnknownSource(name.to_string()))?;
        SourceRecord::try_from(model)
    }

    /// Lists the owner's sources, name-ordered.
    pub async fn sources(&self, owner: &str) -> ResultEngine<Vec<SourceRecord>> {
        let models = sources::Entity::find()
            .filter(sources::Column::Owner.eq(owner))
            .order_by_asc(sources::Column::Name)
            .all(&self.database)
            .await?;

        models.into_iter().map(SourceRecord::try_from).collect()
    }

    /// Known source names, handed to the extractor for disambiguation.
    pub async fn source_names(&self, owner: &str) -> ResultEngine<Vec<String>> {
        let mut names: Vec<String> = self
            .sources(owner)
            .await?
            .into_iter()
            .map(|record| record.name)
            .collect();
        names.dedup();
        Ok(names)
    }

    /// Lists the owner's known expense categories, name-ordered.
    pub async fn categories(&self, owner: &str) -> ResultEngine<Vec<String>> {
        let models = categories::Entity::find()
            .filter(categories::Column::Owner.eq(owner))
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;

        Ok(models.into_iter().map(|model| model.name).collect())
    }
}
