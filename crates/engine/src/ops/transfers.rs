use crate::{EngineError, LedgerEntry, ResultEngine};

use super::Engine;

/// Inputs for a peer transfer.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: i64,
    pub guild_id: Option<String>,
    pub reason: Option<String>,
}

/// Post-transfer balances for both parties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferOutcome {
    pub from_balance: i64,
    pub to_balance: i64,
}

impl Engine {
    /// Moves `amount` from one account to another, all-or-nothing.
    ///
    /// The funds check runs inside the same transaction as both writes and
    /// the ledger append, so a stale read can never overdraw the sender.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome> {
        if cmd.from_user_id == cmd.to_user_id {
            return Err(EngineError::SelfTransfer(
                "from and to must differ".to_string(),
            ));
        }
        if cmd.amount <= 0 {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }

        let TransferCmd {
            from_user_id,
            to_user_id,
            amount,
            guild_id,
            reason,
        } = cmd;

        // The closure owns the command data and clones it per attempt, so the
        // returned future borrows nothing beyond the transaction itself and
        // the work can re-run after a conflict.
        self.with_retry(move |engine, db_tx| {
            let from = from_user_id.clone();
            let to = to_user_id.clone();
            let guild_id = guild_id.clone();
            let reason = reason.clone();
            Box::pin(async move {
                engine.ensure_account(db_tx, &from).await?;
                engine.ensure_account(db_tx, &to).await?;

                let from_balance = engine.apply_delta(db_tx, &from, -amount).await?;
                let to_balance = engine.apply_delta(db_tx, &to, amount).await?;

                let entry =
                    LedgerEntry::transfer(&from, &to, amount, guild_id.as_deref(), reason.as_deref())?;
                engine.append_entry(db_tx, &entry).await?;

                Ok(TransferOutcome {
                    from_balance,
                    to_balance,
                })
            })
        })
        .await
    }
}
