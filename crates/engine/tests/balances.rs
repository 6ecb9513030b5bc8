use chrono::{TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountKind, DeleteTransactionCmd, Engine, NewAccountCmd, NewTransactionCmd,
    UpdateTransactionCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, role) VALUES (?, ?)",
            vec![user.into(), "user".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn new_account(engine: &Engine, name: &str, initial: i64) -> Uuid {
    engine
        .create_account(
            NewAccountCmd::new("alice", name, AccountKind::Bank).initial_balance_minor(initial),
        )
        .await
        .unwrap()
        .id
}

async fn corrupt_balance(db: &DatabaseConnection, account_id: Uuid, by: i64) {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE financial_account SET balance = balance + ? WHERE id = ?",
        vec![by.into(), account_id.into()],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn ledger_matches_after_a_sequence_of_operations() {
    let (engine, _db) = engine_with_db().await;
    let a = new_account(&engine, "A", 10_000).await;
    let b = new_account(&engine, "B", 0).await;

    let salary = engine
        .create_transaction(NewTransactionCmd::income(
            "alice",
            a,
            2_500,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
        .await
        .unwrap();
    let move_out = engine
        .create_transaction(NewTransactionCmd::transfer(
            "alice",
            a,
            b,
            1_000,
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        ))
        .await
        .unwrap();
    engine
        .create_transaction(NewTransactionCmd::expense(
            "alice",
            b,
            300,
            Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
        ))
        .await
        .unwrap();
    engine
        .update_transaction(UpdateTransactionCmd::new("alice", move_out.id).amount_minor(1_200))
        .await
        .unwrap();
    engine
        .delete_transaction(DeleteTransactionCmd::new("alice", salary.id))
        .await
        .unwrap();
    engine.delete_account(b, "alice").await.unwrap();

    assert!(engine.verify_balances("alice").await.unwrap().is_empty());
    assert_eq!(engine.account(a, "alice").await.unwrap().balance_minor, 8_800);
    assert_eq!(engine.account(b, "alice").await.unwrap().balance_minor, 900);
}

#[tokio::test]
async fn recompute_repairs_drifted_balances() {
    let (engine, db) = engine_with_db().await;
    let a = new_account(&engine, "A", 500).await;
    let b = new_account(&engine, "B", 0).await;
    engine
        .create_transaction(NewTransactionCmd::transfer(
            "alice",
            a,
            b,
            200,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        ))
        .await
        .unwrap();

    corrupt_balance(&db, a, 37).await;
    corrupt_balance(&db, b, -5).await;

    let found = engine.verify_balances("alice").await.unwrap();
    assert_eq!(found.len(), 2);
    let drift_a = found.iter().find(|item| item.account_id == a).unwrap();
    assert_eq!(drift_a.stored_minor, 337);
    assert_eq!(drift_a.expected_minor, 300);
    assert_eq!(drift_a.drift_minor(), 37);

    assert_eq!(engine.recompute_balances("alice").await.unwrap(), 2);
    assert!(engine.verify_balances("alice").await.unwrap().is_empty());
    assert_eq!(engine.account(a, "alice").await.unwrap().balance_minor, 300);
    assert_eq!(engine.account(b, "alice").await.unwrap().balance_minor, 200);

    assert_eq!(engine.recompute_balances("alice").await.unwrap(), 0);
}

#[tokio::test]
async fn history_runs_from_initial_balance_in_date_order() {
    let (engine, _db) = engine_with_db().await;
    let a = new_account(&engine, "A", 1_000).await;
    let b = new_account(&engine, "B", 0).await;

    let later = engine
        .create_transaction(NewTransactionCmd::expense(
            "alice",
            a,
            150,
            Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
        ))
        .await
        .unwrap();
    let earlier = engine
        .create_transaction(NewTransactionCmd::transfer(
            "alice",
            b,
            a,
            400,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        ))
        .await
        .unwrap();

    let history = engine.balance_history(a, "alice").await.unwrap();
    let points: Vec<(Uuid, i64)> = history
        .iter()
        .map(|point| (point.transaction_id, point.balance_minor))
        .collect();
    assert_eq!(points, vec![(earlier.id, 1_400), (later.id, 1_250)]);

    let history_b = engine.balance_history(b, "alice").await.unwrap();
    assert_eq!(history_b.len(), 1);
    assert_eq!(history_b[0].balance_minor, -400);

    assert!(engine.balance_history(a, "bob").await.is_err());
}
