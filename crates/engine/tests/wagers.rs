use engine::{
    AdminAdjustCmd, CoinSide, Engine, EngineError, EntryKind, ProposeWagerCmd, WagerStatus,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use uuid::Uuid;

async fn setup() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

/// File-backed database, so concurrent transactions contend for real instead
/// of each pool connection seeing its own in-memory store.
async fn setup_shared() -> (Engine, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("guilder-wagers-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = Database::connect(&url).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    (engine, path)
}

async fn seed(engine: &Engine, user: &str, amount: i64) {
    engine
        .admin_add(AdminAdjustCmd {
            operator_id: "op".to_string(),
            operator: true,
            target_user_id: user.to_string(),
            amount,
            guild_id: None,
            reason: None,
        })
        .await
        .unwrap();
}

fn challenge(challenger: &str, opponent: &str, bet: i64) -> ProposeWagerCmd {
    ProposeWagerCmd {
        challenger_id: challenger.to_string(),
        opponent_id: opponent.to_string(),
        bet_amount: bet,
        challenger_side: CoinSide::Heads,
        guild_id: None,
        channel_id: None,
        message_id: None,
    }
}

#[tokio::test]
async fn proposal_reserves_nothing() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();
    assert_eq!(wager.status, WagerStatus::Pending);
    assert_eq!(engine.balance("alice").await.unwrap(), 100);
    assert_eq!(engine.list_ledger("alice", 10, 0).await.unwrap().total, 1);
}

#[tokio::test]
async fn accept_settles_both_stakes() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;
    seed(&engine, "bob", 100).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();
    let settlement = engine.accept_wager(wager.id, "bob").await.unwrap();

    assert_eq!(settlement.wager.status, WagerStatus::Completed);
    assert_eq!(settlement.wager.result_side, Some(settlement.result_side));
    assert_eq!(
        settlement.wager.winner_id.as_deref(),
        Some(settlement.winner_id.as_str())
    );

    // Zero-sum: the winner gains exactly what the loser pays.
    let (winner_balance, loser_balance) = if settlement.winner_id == "alice" {
        (settlement.challenger_balance, settlement.opponent_balance)
    } else {
        (settlement.opponent_balance, settlement.challenger_balance)
    };
    assert_eq!(winner_balance, 140);
    assert_eq!(loser_balance, 60);
    assert_eq!(
        engine.balance(&settlement.winner_id).await.unwrap(),
        winner_balance
    );
    assert_eq!(
        engine.balance(&settlement.loser_id).await.unwrap(),
        loser_balance
    );

    // Two bet debits plus one payout credit, all tagged with the wager.
    let winner_page = engine
        .list_ledger(&settlement.winner_id, 10, 0)
        .await
        .unwrap();
    let kinds: Vec<_> = winner_page
        .entries
        .iter()
        .filter(|e| e.wager_id == Some(wager.id))
        .map(|e| e.kind)
        .collect();
    assert!(kinds.contains(&EntryKind::CoinflipBet));
    assert!(kinds.contains(&EntryKind::CoinflipPayout));

    let loser_page = engine
        .list_ledger(&settlement.loser_id, 10, 0)
        .await
        .unwrap();
    let loser_kinds: Vec<_> = loser_page
        .entries
        .iter()
        .filter(|e| e.wager_id == Some(wager.id))
        .map(|e| e.kind)
        .collect();
    assert_eq!(loser_kinds, vec![EntryKind::CoinflipBet]);

    for user in ["alice", "bob"] {
        assert_eq!(
            engine.recompute_balance(user).await.unwrap(),
            engine.balance(user).await.unwrap(),
        );
    }
}

#[tokio::test]
async fn decline_leaves_balances_untouched() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;
    seed(&engine, "bob", 100).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();
    let declined = engine.decline_wager(wager.id, "bob").await.unwrap();

    assert_eq!(declined.status, WagerStatus::Declined);
    assert!(declined.resolved_at.is_some());
    assert_eq!(engine.balance("alice").await.unwrap(), 100);
    assert_eq!(engine.balance("bob").await.unwrap(), 100);
    // Only the seed entries exist.
    assert_eq!(engine.list_ledger("alice", 10, 0).await.unwrap().total, 1);
}

#[tokio::test]
async fn resolving_twice_fails_with_already_resolved() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;
    seed(&engine, "bob", 100).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();
    engine.accept_wager(wager.id, "bob").await.unwrap();

    let err = engine.accept_wager(wager.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyResolved(_)));
    let err = engine.decline_wager(wager.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyResolved(_)));

    // The second attempts settle nothing.
    assert_eq!(
        engine.balance("alice").await.unwrap() + engine.balance("bob").await.unwrap(),
        200
    );
}

#[tokio::test]
async fn racing_accepts_settle_exactly_once() {
    let (engine, path) = setup_shared().await;
    seed(&engine, "alice", 100).await;
    seed(&engine, "bob", 100).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        engine.accept_wager(wager.id, "bob"),
        engine.accept_wager(wager.id, "bob"),
    );

    let (settlement, err) = match (first, second) {
        (Ok(settlement), Err(err)) => (settlement, err),
        (Err(err), Ok(settlement)) => (settlement, err),
        other => panic!("expected exactly one settlement, got {other:?}"),
    };
    assert!(matches!(err, EngineError::AlreadyResolved(_)));
    assert_eq!(settlement.wager.status, WagerStatus::Completed);

    // One settlement's worth of ledger rows, never two.
    let mut tagged = std::collections::HashSet::new();
    for user in ["alice", "bob"] {
        for entry in engine.list_ledger(user, 50, 0).await.unwrap().entries {
            if entry.wager_id == Some(wager.id) {
                tagged.insert(entry.id);
            }
        }
    }
    assert_eq!(tagged.len(), 3);

    assert_eq!(
        engine.balance("alice").await.unwrap() + engine.balance("bob").await.unwrap(),
        200
    );

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn accept_after_decline_fails() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;
    seed(&engine, "bob", 100).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();
    engine.decline_wager(wager.id, "bob").await.unwrap();

    let err = engine.accept_wager(wager.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyResolved(_)));
}

#[tokio::test]
async fn only_the_opponent_may_resolve() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;
    seed(&engine, "bob", 100).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();

    for actor in ["alice", "mallory"] {
        let err = engine.accept_wager(wager.id, actor).await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
        let err = engine.decline_wager(wager.id, actor).await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }

    // Still pending, still resolvable by the real opponent.
    engine.accept_wager(wager.id, "bob").await.unwrap();
}

#[tokio::test]
async fn unknown_wager_is_not_found() {
    let engine = setup().await;
    let missing = Uuid::new_v4();

    let err = engine.accept_wager(missing, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = engine.decline_wager(missing, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn settlement_requires_funds_from_both_parties() {
    let engine = setup().await;
    seed(&engine, "alice", 100).await;
    seed(&engine, "bob", 10).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();
    let err = engine.accept_wager(wager.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    // A failed settlement leaves the wager pending and funds in place.
    assert_eq!(engine.balance("alice").await.unwrap(), 100);
    assert_eq!(engine.balance("bob").await.unwrap(), 10);
    seed(&engine, "bob", 90).await;
    let settlement = engine.accept_wager(wager.id, "bob").await.unwrap();
    assert_eq!(settlement.wager.status, WagerStatus::Completed);
}

#[tokio::test]
async fn challenger_funds_checked_at_settlement_time() {
    let engine = setup().await;
    seed(&engine, "alice", 40).await;
    seed(&engine, "bob", 100).await;

    let wager = engine
        .propose_wager(challenge("alice", "bob", 40))
        .await
        .unwrap();
    // The challenger spends the stake while the proposal is pending.
    engine
        .admin_remove(AdminAdjustCmd {
            operator_id: "op".to_string(),
            operator: true,
            target_user_id: "alice".to_string(),
            amount: 40,
            guild_id: None,
            reason: None,
        })
        .await
        .unwrap();

    let err = engine.accept_wager(wager.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
}

#[tokio::test]
async fn self_and_nonpositive_wagers_rejected() {
    let engine = setup().await;

    let err = engine
        .propose_wager(challenge("alice", "alice", 40))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SelfTransfer(_)));

    let err = engine
        .propose_wager(challenge("alice", "bob", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}
