use crate::{EngineError, EntryKind, LedgerEntry, ResultEngine};

use super::Engine;

/// Inputs for a privileged balance adjustment.
///
/// The operator allow-list lives with the caller; `operator` reports the
/// outcome of that check and is re-validated here as defense in depth.
#[derive(Clone, Debug)]
pub struct AdminAdjustCmd {
    pub operator_id: String,
    pub operator: bool,
    pub target_user_id: String,
    pub amount: i64,
    pub guild_id: Option<String>,
    pub reason: Option<String>,
}

impl AdminAdjustCmd {
    fn validate(&self) -> ResultEngine<()> {
        if !self.operator {
            return Err(EngineError::NotAuthorized(format!(
                "{} is not an operator",
                self.operator_id
            )));
        }
        if self.amount <= 0 {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Engine {
    /// Credits the target unconditionally. Returns the new balance.
    pub async fn admin_add(&self, cmd: AdminAdjustCmd) -> ResultEngine<i64> {
        cmd.validate()?;
        let AdminAdjustCmd {
            target_user_id,
            amount,
            guild_id,
            reason,
            ..
        } = cmd;

        // Owned captures, cloned per attempt, keep the work re-runnable.
        self.with_retry(move |engine, db_tx| {
            let target = target_user_id.clone();
            let guild_id = guild_id.clone();
            let reason = reason.clone();
            Box::pin(async move {
                let balance = engine.apply_delta(db_tx, &target, amount).await?;
                let entry = LedgerEntry::credit(
                    EntryKind::AdminAdd,
                    &target,
                    amount,
                    guild_id.as_deref(),
                    reason.as_deref(),
                )?;
                engine.append_entry(db_tx, &entry).await?;
                Ok(balance)
            })
        })
        .await
    }

    /// Debits the target, funds-checked. Returns the new balance.
    pub async fn admin_remove(&self, cmd: AdminAdjustCmd) -> ResultEngine<i64> {
        cmd.validate()?;
        let AdminAdjustCmd {
            target_user_id,
            amount,
            guild_id,
            reason,
            ..
        } = cmd;

        self.with_retry(move |engine, db_tx| {
            let target = target_user_id.clone();
            let guild_id = guild_id.clone();
            let reason = reason.clone();
            Box::pin(async move {
                let balance = engine.apply_delta(db_tx, &target, -amount).await?;
                let entry = LedgerEntry::debit(
                    EntryKind::AdminRemove,
                    &target,
                    amount,
                    guild_id.as_deref(),
                    reason.as_deref(),
                )?;
                engine.append_entry(db_tx, &entry).await?;
                Ok(balance)
            })
        })
        .await
    }
}
