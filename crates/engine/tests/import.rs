use chrono::{TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::json;

use engine::{
    AccountKind, Engine, EngineError, FinancerSnapshot, NewAccountCmd, NewTransactionCmd,
    TransactionKind, TransactionListFilter,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (user, role) in [("root", "admin"), ("alice", "user")] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, role) VALUES (?, ?)",
            vec![user.into(), role.into()],
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

fn snapshot() -> FinancerSnapshot {
    FinancerSnapshot::from_json(
        &json!({
            "accounts": [
                { "_id": "acc-c", "name": "Old card", "type": "credit", "balance": -20, "isDeleted": true },
                { "_id": "acc-a", "name": "Checking", "type": "checking", "balance": 1200.5 },
                { "_id": "acc-b", "name": "Pocket", "type": "cash", "balance": "80" }
            ],
            "transactions": [
                { "_id": "t1", "toAccount": "acc-a", "amount": 1500, "description": "salary",
                  "date": "2024-01-31T09:00:00Z" },
                { "_id": "t2", "fromAccount": "acc-a", "toAccount": "acc-b", "amount": "100.25",
                  "date": "2024-02-01T10:00:00Z" },
                { "_id": "t3", "fromAccount": "acc-c", "amount": 20,
                  "date": "2023-12-01T10:00:00Z" }
            ]
        })
        .to_string(),
    )
    .unwrap()
}

async fn seed_previous_data(engine: &Engine) {
    let account = engine
        .create_account(NewAccountCmd::new("root", "Legacy", AccountKind::Bank).initial_balance_minor(999))
        .await
        .unwrap();
    let category = engine
        .create_category("root", "Legacy", TransactionKind::Expense)
        .await
        .unwrap();
    engine
        .create_transaction(
            NewTransactionCmd::expense(
                "root",
                account.id,
                9,
                Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            )
            .category_id(category.id),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn import_reproduces_exported_balances() {
    let (engine, _db) = engine_with_db().await;
    seed_previous_data(&engine).await;

    let summary = engine
        .import_financer_snapshot("root", &snapshot())
        .await
        .unwrap();

    assert_eq!(summary.removed_accounts, 1);
    assert_eq!(summary.removed_transactions, 1);
    assert_eq!(summary.removed_categories, 1);
    assert_eq!(summary.accounts_created, 3);
    assert_eq!(summary.accounts_deleted, 1);
    assert_eq!(summary.transactions_created, 3);

    let keys: Vec<&str> = summary.account_ids.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["acc-a", "acc-b", "acc-c"]);
    let printed = serde_json::to_string(&summary).unwrap();
    let position = |key: &str| printed.find(key).unwrap();
    assert!(position("acc-a") < position("acc-b"));
    assert!(position("acc-b") < position("acc-c"));

    let a = engine
        .account(summary.account_ids["acc-a"], "root")
        .await
        .unwrap();
    let b = engine
        .account(summary.account_ids["acc-b"], "root")
        .await
        .unwrap();
    let c = engine
        .account(summary.account_ids["acc-c"], "root")
        .await
        .unwrap();

    assert_eq!(a.balance_minor, 1_200_50);
    assert_eq!(a.initial_balance_minor, 1_200_50 - 1_500_00 + 100_25);
    assert_eq!(a.kind, AccountKind::Bank);
    assert_eq!(b.balance_minor, 80_00);
    assert_eq!(b.initial_balance_minor, 80_00 - 100_25);
    assert_eq!(b.kind, AccountKind::Wallet);
    assert_eq!(c.balance_minor, -20_00);
    assert_eq!(c.initial_balance_minor, 0);
    assert!(c.deleted);

    assert_eq!(engine.accounts("root").await.unwrap().len(), 2);
    assert!(engine.categories("root").await.unwrap().is_empty());
    assert!(engine.verify_balances("root").await.unwrap().is_empty());

    let listed = engine
        .transactions("root", &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].amount_minor, 100_25);
    assert_eq!(listed[1].description, "salary");
}

#[tokio::test]
async fn import_leaves_other_users_alone() {
    let (engine, _db) = engine_with_db().await;
    let mine = engine
        .create_account(NewAccountCmd::new("alice", "Mine", AccountKind::Bank).initial_balance_minor(10))
        .await
        .unwrap();

    engine
        .import_financer_snapshot("root", &snapshot())
        .await
        .unwrap();

    let accounts = engine.accounts("alice").await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].id, mine.id);
    assert_eq!(accounts[0].balance_minor, 10);
}

#[tokio::test]
async fn invalid_snapshot_keeps_previous_data() {
    let (engine, _db) = engine_with_db().await;
    seed_previous_data(&engine).await;

    let broken = FinancerSnapshot::from_json(
        &json!({
            "accounts": [
                { "_id": "a1", "name": "A", "type": "bank", "balance": 0 }
            ],
            "transactions": [
                { "_id": "t1", "fromAccount": "a1", "toAccount": "zz", "amount": 1,
                  "date": "2024-01-01T00:00:00Z" }
            ]
        })
        .to_string(),
    )
    .unwrap();

    let err = engine
        .import_financer_snapshot("root", &broken)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidSnapshot("transactions[0].toAccount: unknown account \"zz\"".to_string())
    );

    let accounts = engine.accounts("root").await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Legacy");
    assert_eq!(engine.categories("root").await.unwrap().len(), 1);
}

#[tokio::test]
async fn failure_while_writing_rolls_back_everything() {
    let (engine, db) = engine_with_db().await;
    seed_previous_data(&engine).await;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE TRIGGER refuse_large BEFORE INSERT ON \"transaction\" \
         WHEN NEW.amount > 100000 BEGIN SELECT RAISE(ABORT, 'refused'); END",
    ))
    .await
    .unwrap();

    let err = engine
        .import_financer_snapshot("root", &snapshot())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    let accounts = engine.accounts("root").await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Legacy");
    assert_eq!(accounts[0].balance_minor, 990);
    assert_eq!(
        engine
            .transactions("root", &TransactionListFilter::default())
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(engine.categories("root").await.unwrap().len(), 1);
}

#[tokio::test]
async fn replay_overflow_rolls_back_everything() {
    let (engine, _db) = engine_with_db().await;
    seed_previous_data(&engine).await;

    // Nets to zero, but the running balance passes i64::MAX half way.
    let spiking = FinancerSnapshot::from_json(
        &json!({
            "accounts": [
                { "_id": "a1", "name": "A", "type": "bank", "balance": "0.01" }
            ],
            "transactions": [
                { "_id": "t1", "toAccount": "a1", "amount": "92233720368547758.07",
                  "date": "2024-01-01T00:00:00Z" },
                { "_id": "t2", "fromAccount": "a1", "amount": "92233720368547758.07",
                  "date": "2024-01-02T00:00:00Z" }
            ]
        })
        .to_string(),
    )
    .unwrap();
    spiking.validate().unwrap();

    let err = engine
        .import_financer_snapshot("root", &spiking)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let accounts = engine.accounts("root").await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Legacy");
    assert_eq!(accounts[0].balance_minor, 990);
    assert!(engine.verify_balances("root").await.unwrap().is_empty());
}
