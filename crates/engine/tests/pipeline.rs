use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::json;

use engine::{Engine, EngineError, Movement, MovementKind, SourceKind};

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn coffee_raw() -> serde_json::Value {
    json!({
        "name": "Coffee",
        "description": "flat white",
        "movement_type": "expense",
        "amount": 4.50,
        "source_name": "CASH",
        "source_type": "cash",
        "category": "food",
    })
}

fn paycheck_raw() -> serde_json::Value {
    json!({
        "name": "Paycheck",
        "description": "january salary",
        "movement_type": "income",
        "amount": 20.00,
        "source_name": "BBVA",
        "source_type": "debit_card",
        "category": "income",
    })
}

#[tokio::test]
async fn expense_registers_category_exactly_once() {
    let engine = engine_with_db().await;

    engine.normalize(coffee_raw(), "alice").await.unwrap();
    assert_eq!(engine.categories("alice").await.unwrap(), vec!["FOOD"]);

    // Idempotent: a second normalize with the same category writes nothing.
    engine.normalize(coffee_raw(), "alice").await.unwrap();
    assert_eq!(engine.categories("alice").await.unwrap(), vec!["FOOD"]);
}

#[tokio::test]
async fn income_never_registers_a_category() {
    let engine = engine_with_db().await;

    engine.normalize(paycheck_raw(), "alice").await.unwrap();
    engine.normalize(paycheck_raw(), "alice").await.unwrap();

    assert!(engine.categories("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn income_with_foreign_category_is_rejected() {
    let engine = engine_with_db().await;

    let mut raw = paycheck_raw();
    raw["category"] = json!("bonus");

    let err = engine.normalize(raw, "alice").await.unwrap_err();
    assert_eq!(err, EngineError::CategoryMovementMismatch("BONUS".to_string()));
    // Nothing was registered on the way out.
    assert!(engine.sources("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn normalize_is_partitioned_by_owner() {
    let engine = engine_with_db().await;

    engine.normalize(coffee_raw(), "alice").await.unwrap();

    assert!(engine.categories("bob").await.unwrap().is_empty());
    assert!(engine.sources("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn apply_follows_the_sign_rule() {
    let engine = engine_with_db().await;
    engine
        .create_source("alice", "BBVA", SourceKind::DebitCard, Some("1234"), 10_000)
        .await
        .unwrap();

    let expense = engine
        .normalize(
            json!({
                "name": "Lunch",
                "movement_type": "expense",
                "amount": 4.50,
                "source_name": "BBVA",
                "source_type": "debit_card",
                "category": "food",
            }),
            "alice",
        )
        .await
        .unwrap();
    let record = engine.apply(&expense).await.unwrap();
    assert_eq!(record.balance_minor, 9_550);

    let income = engine
        .normalize(
            json!({
                "name": "Refund",
                "movement_type": "income",
                "amount": 20.00,
                "source_name": "BBVA",
                "source_type": "debit_card",
                "category": "income",
            }),
            "alice",
        )
        .await
        .unwrap();
    let record = engine.apply(&income).await.unwrap();
    assert_eq!(record.balance_minor, 11_550);
}

#[tokio::test]
async fn zero_amount_apply_leaves_balance_untouched() {
    let engine = engine_with_db().await;
    engine
        .create_source("alice", "CASH", SourceKind::Cash, None, 1_234)
        .await
        .unwrap();

    let mut raw = coffee_raw();
    raw["amount"] = json!(0);
    let movement = engine.normalize(raw, "alice").await.unwrap();
    assert_eq!(movement.amount_minor, 0);

    let record = engine.apply(&movement).await.unwrap();
    assert_eq!(record.balance_minor, 1_234);
}

#[tokio::test]
async fn concurrent_applies_accumulate() {
    let engine = engine_with_db().await;
    engine
        .create_source("alice", "CASH", SourceKind::Cash, None, 5_000)
        .await
        .unwrap();

    let expense = engine.normalize(coffee_raw(), "alice").await.unwrap();
    let mut raw = coffee_raw();
    raw["name"] = json!("Bagel");
    raw["amount"] = json!(3.00);
    let other = engine.normalize(raw, "alice").await.unwrap();

    let (first, second) = tokio::join!(engine.apply(&expense), engine.apply(&other));
    first.unwrap();
    second.unwrap();

    let record = engine.source("alice", "CASH", SourceKind::Cash).await.unwrap();
    assert_eq!(record.balance_minor, 5_000 - 450 - 300);
}

#[tokio::test]
async fn apply_against_unknown_source_fails_without_writes() {
    let engine = engine_with_db().await;

    let movement = Movement {
        id: uuid::Uuid::new_v4(),
        owner: "alice".to_string(),
        name: "Ghost".to_string(),
        description: String::new(),
        kind: MovementKind::Expense,
        amount_minor: 100,
        source_name: "NOWHERE".to_string(),
        source_kind: SourceKind::Cash,
        category: "FOOD".to_string(),
        occurred_at: chrono::Utc::now(),
    };

    let err = engine.apply(&movement).await.unwrap_err();
    assert_eq!(err, EngineError::UnknownSource("NOWHERE".to_string()));
    assert!(engine.sources("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn first_movement_of_a_new_user_end_to_end() {
    let engine = engine_with_db().await;

    let movement = engine.normalize(coffee_raw(), "alice").await.unwrap();
    assert_eq!(movement.category, "FOOD");
    assert_eq!(movement.source_name, "CASH");

    // The lazily-created source opens at 0; recording moves it.
    let fresh = engine.source("alice", "CASH", SourceKind::Cash).await.unwrap();
    assert_eq!(fresh.balance_minor, 0);

    let record = engine.record(&movement).await.unwrap();
    assert_eq!(record.balance_minor, -450);

    let history = engine.recent_movements("alice", 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].name, "Coffee");
    assert_eq!(history[0].amount_minor, 450);
}

#[tokio::test]
async fn rejection_keeps_taxonomy_but_writes_nothing_else() {
    let engine = engine_with_db().await;

    // Normalize and then drop the movement, as the chat loop does on "no".
    let movement = engine.normalize(coffee_raw(), "alice").await.unwrap();
    drop(movement);

    assert_eq!(engine.categories("alice").await.unwrap(), vec!["FOOD"]);
    let record = engine.source("alice", "CASH", SourceKind::Cash).await.unwrap();
    assert_eq!(record.balance_minor, 0);
    assert!(engine.recent_movements("alice", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_wallet_creation_is_rejected() {
    let engine = engine_with_db().await;

    engine
        .create_source("alice", "Bbva", SourceKind::DebitCard, Some("1234"), 0)
        .await
        .unwrap();
    let err = engine
        .create_source("alice", "BBVA", SourceKind::DebitCard, Some("1234"), 0)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingSource("BBVA".to_string()));

    // Same name under a different kind is a distinct source.
    engine
        .create_source("alice", "BBVA", SourceKind::CreditCard, Some("9876"), 0)
        .await
        .unwrap();
    assert_eq!(engine.sources("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn totals_sum_the_movement_log() {
    let engine = engine_with_db().await;

    let income = engine.normalize(paycheck_raw(), "alice").await.unwrap();
    engine.record(&income).await.unwrap();
    let expense = engine.normalize(coffee_raw(), "alice").await.unwrap();
    engine.record(&expense).await.unwrap();

    let (total_income, total_expenses) = engine.totals("alice").await.unwrap();
    assert_eq!(total_income, 2_000);
    assert_eq!(total_expenses, 450);

    let (none_income, none_expenses) = engine.totals("bob").await.unwrap();
    assert_eq!((none_income, none_expenses), (0, 0));
}
