use chrono::Utc;
use sea_orm::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    CoinSide, EngineError, EntryKind, LedgerEntry, ResultEngine, Wager, WagerStatus, wagers,
};

use super::Engine;

/// Inputs for proposing a coinflip wager.
#[derive(Clone, Debug)]
pub struct ProposeWagerCmd {
    pub challenger_id: String,
    pub opponent_id: String,
    pub bet_amount: i64,
    pub challenger_side: CoinSide,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
}

/// Outcome of an accepted wager: resolved side, parties, and both
/// post-settlement balances.
#[derive(Clone, Debug)]
pub struct WagerSettlement {
    pub wager: Wager,
    pub result_side: CoinSide,
    pub winner_id: String,
    pub loser_id: String,
    pub challenger_balance: i64,
    pub opponent_balance: i64,
}

/// One uniformly random bit mapped onto the coin.
fn flip() -> CoinSide {
    if rand::random::<bool>() {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    }
}

impl Engine {
    /// Creates a `pending` wager. No funds are touched or reserved; funds
    /// are validated at settlement time, so a proposal can outlive the
    /// challenger's ability to pay.
    pub async fn propose_wager(&self, cmd: ProposeWagerCmd) -> ResultEngine<Wager> {
        let wager = Wager::new(
            cmd.challenger_id,
            cmd.opponent_id,
            cmd.bet_amount,
            cmd.challenger_side,
            cmd.guild_id,
            cmd.channel_id,
            cmd.message_id,
        )?;

        let record = wager.clone();
        self.with_retry(move |_engine, db_tx| {
            let active = wagers::ActiveModel::from(&record);
            Box::pin(async move {
                active.insert(db_tx).await?;
                Ok(())
            })
        })
        .await?;
        Ok(wager)
    }

    async fn require_pending_for(
        &self,
        db: &sea_orm::DatabaseTransaction,
        wager_id: Uuid,
        acting_user_id: &str,
    ) -> ResultEngine<Wager> {
        let model = wagers::Entity::find_by_id(wager_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("wager {wager_id}")))?;
        let wager = Wager::try_from(model)?;
        if wager.status != WagerStatus::Pending {
            return Err(EngineError::AlreadyResolved(format!(
                "wager {wager_id} is {}",
                wager.status.as_str()
            )));
        }
        if wager.opponent_id != acting_user_id {
            return Err(EngineError::Forbidden(
                "only the opponent may resolve a wager".to_string(),
            ));
        }
        Ok(wager)
    }

    /// Declines a `pending` wager. No funds move and no ledger rows are
    /// written.
    pub async fn decline_wager(
        &self,
        wager_id: Uuid,
        acting_user_id: &str,
    ) -> ResultEngine<Wager> {
        let acting = acting_user_id.to_string();
        self.with_retry(move |engine, db_tx| {
            let acting = acting.clone();
            Box::pin(async move {
                let mut wager = engine
                    .require_pending_for(db_tx, wager_id, &acting)
                    .await?;

                wager.status = WagerStatus::Declined;
                wager.resolved_at = Some(Utc::now());

                let active = wagers::ActiveModel {
                    id: ActiveValue::Set(wager.id.to_string()),
                    status: ActiveValue::Set(wager.status.as_str().to_string()),
                    resolved_at: ActiveValue::Set(wager.resolved_at),
                    ..Default::default()
                };
                active.update(db_tx).await?;
                Ok(wager)
            })
        })
        .await
    }

    /// Accepts a `pending` wager: resolves the outcome and settles funds in
    /// one transaction.
    ///
    /// The status re-read inside the transaction makes settlement
    /// at-most-once: when two resolutions race, the second committed writer
    /// observes a non-pending status and gets `AlreadyResolved` instead of
    /// double-settling.
    pub async fn accept_wager(
        &self,
        wager_id: Uuid,
        acting_user_id: &str,
    ) -> ResultEngine<WagerSettlement> {
        let acting = acting_user_id.to_string();
        self.with_retry(move |engine, db_tx| {
            let acting = acting.clone();
            Box::pin(async move {
                let mut wager = engine
                    .require_pending_for(db_tx, wager_id, &acting)
                    .await?;
                let bet = wager.bet_amount;
                let challenger = wager.challenger_id.clone();
                let opponent = wager.opponent_id.clone();
                let guild_id = wager.guild_id.clone();

                // Funds are checked at settlement time, not proposal time, so
                // a stale proposal cannot settle against an empty wallet.
                let challenger_balance = engine.ensure_account(db_tx, &challenger).await?;
                let opponent_balance = engine.ensure_account(db_tx, &opponent).await?;
                if challenger_balance < bet {
                    return Err(EngineError::InsufficientFunds(format!(
                        "challenger {challenger} holds {challenger_balance}, needs {bet}"
                    )));
                }
                if opponent_balance < bet {
                    return Err(EngineError::InsufficientFunds(format!(
                        "opponent {opponent} holds {opponent_balance}, needs {bet}"
                    )));
                }
                let payout = bet.checked_mul(2).ok_or_else(|| {
                    EngineError::InvalidAmount("payout overflow".to_string())
                })?;

                let result_side = flip();
                let (winner, loser) = if result_side == wager.challenger_side {
                    (challenger.clone(), opponent.clone())
                } else {
                    (opponent.clone(), challenger.clone())
                };

                let mut challenger_balance =
                    engine.apply_delta(db_tx, &challenger, -bet).await?;
                let mut opponent_balance = engine.apply_delta(db_tx, &opponent, -bet).await?;
                let winner_balance = engine.apply_delta(db_tx, &winner, payout).await?;
                if winner == challenger {
                    challenger_balance = winner_balance;
                } else {
                    opponent_balance = winner_balance;
                }

                let guild = guild_id.as_deref();
                engine
                    .append_entry(
                        db_tx,
                        &LedgerEntry::debit(EntryKind::CoinflipBet, &challenger, bet, guild, None)?
                            .with_wager(wager.id),
                    )
                    .await?;
                engine
                    .append_entry(
                        db_tx,
                        &LedgerEntry::debit(EntryKind::CoinflipBet, &opponent, bet, guild, None)?
                            .with_wager(wager.id),
                    )
                    .await?;
                engine
                    .append_entry(
                        db_tx,
                        &LedgerEntry::credit(
                            EntryKind::CoinflipPayout,
                            &winner,
                            payout,
                            guild,
                            None,
                        )?
                        .with_wager(wager.id),
                    )
                    .await?;

                wager.status = WagerStatus::Completed;
                wager.result_side = Some(result_side);
                wager.winner_id = Some(winner.clone());
                wager.resolved_at = Some(Utc::now());

                let active = wagers::ActiveModel {
                    id: ActiveValue::Set(wager.id.to_string()),
                    status: ActiveValue::Set(wager.status.as_str().to_string()),
                    result_side: ActiveValue::Set(Some(result_side.as_str().to_string())),
                    winner_id: ActiveValue::Set(Some(winner.clone())),
                    resolved_at: ActiveValue::Set(wager.resolved_at),
                    ..Default::default()
                };
                active.update(db_tx).await?;

                Ok(WagerSettlement {
                    wager,
                    result_side,
                    winner_id: winner,
                    loser_id: loser,
                    challenger_balance,
                    opponent_balance,
                })
            })
        })
        .await
    }
}
