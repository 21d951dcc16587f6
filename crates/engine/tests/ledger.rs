use engine::{AdminAdjustCmd, Engine, EngineError, EntryKind, TransferCmd, TransferOutcome};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

async fn setup() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

/// File-backed database, so concurrent transactions contend for real instead
/// of each pool connection seeing its own in-memory store.
async fn setup_shared() -> (Engine, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("guilder-ledger-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = Database::connect(&url).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    (engine, path)
}

fn grant(target: &str, amount: i64) -> AdminAdjustCmd {
    AdminAdjustCmd {
        operator_id: "op".to_string(),
        operator: true,
        target_user_id: target.to_string(),
        amount,
        guild_id: None,
        reason: None,
    }
}

async fn seed(engine: &Engine, user: &str, amount: i64) {
    engine.admin_add(grant(user, amount)).await.unwrap();
}

fn transfer(from: &str, to: &str, amount: i64) -> TransferCmd {
    TransferCmd {
        from_user_id: from.to_string(),
        to_user_id: to.to_string(),
        amount,
        guild_id: None,
        reason: None,
    }
}

#[tokio::test]
async fn untouched_account_has_zero_balance() {
    let engine = setup().await;
    assert_eq!(engine.balance("nobody").await.unwrap(), 0);
}

#[tokio::test]
async fn transfer_moves_funds_and_appends_one_entry() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;

    let outcome = engine.transfer(transfer("alice", "bob", 30)).await.unwrap();
    assert_eq!(
        outcome,
        TransferOutcome {
            from_balance: 70,
            to_balance: 30
        }
    );
    assert_eq!(engine.balance("alice").await.unwrap(), 70);
    assert_eq!(engine.balance("bob").await.unwrap(), 30);

    let page = engine.list_ledger("bob", 10, 0).await.unwrap();
    assert_eq!(page.total, 1);
    let entry = &page.entries[0];
    assert_eq!(entry.kind, EntryKind::Transfer);
    assert_eq!(entry.amount, 30);
    assert_eq!(entry.from_user_id.as_deref(), Some("alice"));
    assert_eq!(entry.to_user_id.as_deref(), Some("bob"));
}

#[tokio::test]
async fn overdraft_transfer_changes_nothing() {
    let engine = setup().await;
    seed(&engine, "alice", 10).await;

    let err = engine
        .transfer(transfer("alice", "bob", 50))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    assert_eq!(engine.balance("alice").await.unwrap(), 10);
    assert_eq!(engine.balance("bob").await.unwrap(), 0);
    assert_eq!(engine.list_ledger("bob", 10, 0).await.unwrap().total, 0);
}

#[tokio::test]
async fn self_transfer_rejected() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;

    let err = engine
        .transfer(transfer("alice", "alice", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SelfTransfer(_)));
    assert_eq!(engine.balance("alice").await.unwrap(), 100);
}

#[tokio::test]
async fn nonpositive_transfer_rejected() {
    let engine = setup().await;
    for amount in [0, -5] {
        let err = engine
            .transfer(transfer("alice", "bob", amount))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}

#[tokio::test]
async fn admin_adjustments_move_funds() {
    let engine = setup().await;

    assert_eq!(engine.admin_add(grant("carol", 500)).await.unwrap(), 500);

    let mut cmd = grant("carol", 200);
    let removed = engine.admin_remove(cmd.clone()).await.unwrap();
    assert_eq!(removed, 300);

    cmd.amount = 1_000;
    let err = engine.admin_remove(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(engine.balance("carol").await.unwrap(), 300);

    let page = engine.list_ledger("carol", 10, 0).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.entries[0].kind, EntryKind::AdminRemove);
    assert_eq!(page.entries[1].kind, EntryKind::AdminAdd);
}

#[tokio::test]
async fn non_operator_adjustment_rejected() {
    let engine = setup().await;

    let cmd = AdminAdjustCmd {
        operator: false,
        ..grant("carol", 500)
    };
    let err = engine.admin_add(cmd.clone()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAuthorized(_)));
    let err = engine.admin_remove(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAuthorized(_)));

    assert_eq!(engine.balance("carol").await.unwrap(), 0);
}

#[tokio::test]
async fn ledger_pages_newest_first() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;
    for to in ["bob", "carol", "dave"] {
        engine.transfer(transfer("alice", to, 10)).await.unwrap();
    }

    let page = engine.list_ledger("alice", 2, 0).await.unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.entries.len(), 2);
    assert_eq!(page.entries[0].to_user_id.as_deref(), Some("dave"));
    assert_eq!(page.entries[1].to_user_id.as_deref(), Some("carol"));

    let page = engine.list_ledger("alice", 2, 2).await.unwrap();
    assert_eq!(page.entries.len(), 2);
    assert_eq!(page.entries[0].to_user_id.as_deref(), Some("bob"));
    assert_eq!(page.entries[1].kind, EntryKind::AdminAdd);

    // Entries not involving the user stay invisible.
    let page = engine.list_ledger("bob", 10, 0).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn out_of_range_limits_rejected() {
    let engine = setup().await;
    for limit in [0, 201, 1_000] {
        let err = engine.list_ledger("alice", limit, 0).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidPagination(_)));
    }
    assert!(engine.list_ledger("alice", 200, 0).await.is_ok());
}

#[tokio::test]
async fn concurrent_first_touch_lands_both_credits() {
    let (engine, path) = setup_shared().await;
    seed(&engine, "alice", 100).await;
    seed(&engine, "bob", 100).await;

    // Both transfers race to create the same untouched recipient.
    let (first, second) = tokio::join!(
        engine.transfer(transfer("alice", "carol", 10)),
        engine.transfer(transfer("bob", "carol", 20)),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(engine.balance("carol").await.unwrap(), 30);
    assert_eq!(
        engine.recompute_balance("carol").await.unwrap(),
        engine.balance("carol").await.unwrap(),
    );

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn replaying_the_ledger_matches_stored_balances() {
    let engine = setup().await;
    seed(&engine, "alice", 1_000).await;
    seed(&engine, "bob", 250).await;
    engine.transfer(transfer("alice", "bob", 300)).await.unwrap();
    engine.transfer(transfer("bob", "alice", 50)).await.unwrap();
    engine.admin_remove(grant("alice", 100)).await.unwrap();

    for user in ["alice", "bob"] {
        assert_eq!(
            engine.recompute_balance(user).await.unwrap(),
            engine.balance(user).await.unwrap(),
        );
    }
}
