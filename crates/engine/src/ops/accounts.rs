use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, prelude::*, sea_query::OnConflict,
};

use crate::{EngineError, LedgerEntry, ResultEngine, accounts, ledger};

use super::Engine;

/// Upper bound for one ledger page.
const MAX_LEDGER_PAGE: u64 = 200;

/// One page of ledger entries involving a user, plus the total match count.
#[derive(Clone, Debug)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    pub total: u64,
}

impl Engine {
    /// Returns the user's balance, 0 for accounts that were never touched.
    ///
    /// Read-only: never creates a row.
    pub async fn balance(&self, user_id: &str) -> ResultEngine<i64> {
        let model = accounts::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?;
        Ok(model.map(|m| m.balance).unwrap_or(0))
    }

    /// Idempotent account creation with balance 0. Returns the current
    /// balance either way.
    ///
    /// The first-touch insert is on-conflict-do-nothing: two transactions
    /// racing to create the same account must not surface a unique-constraint
    /// violation, which the conflict classifier would refuse to retry.
    pub(super) async fn ensure_account(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<i64> {
        if let Some(model) = accounts::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
        {
            return Ok(model.balance);
        }
        let model = accounts::ActiveModel {
            user_id: ActiveValue::Set(user_id.to_string()),
            balance: ActiveValue::Set(0),
        };
        accounts::Entity::insert(model)
            .on_conflict(
                OnConflict::column(accounts::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;

        let model = accounts::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?;
        Ok(model.map(|m| m.balance).unwrap_or(0))
    }

    /// Applies a signed delta to an account inside the caller's transaction.
    ///
    /// The funds check and the write share the transaction, so a concurrent
    /// debit cannot slip between them. Fails with `InsufficientFunds` before
    /// any write if the result would go negative; overflow is a checked
    /// error, never a wrap.
    pub(super) async fn apply_delta(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        delta: i64,
    ) -> ResultEngine<i64> {
        let current = self.ensure_account(db, user_id).await?;
        let next = current.checked_add(delta).ok_or_else(|| {
            EngineError::InvalidAmount(format!("balance overflow for {user_id}"))
        })?;
        if next < 0 {
            return Err(EngineError::InsufficientFunds(format!(
                "{user_id} holds {current}, needs {}",
                -delta
            )));
        }

        let model = accounts::ActiveModel {
            user_id: ActiveValue::Set(user_id.to_string()),
            balance: ActiveValue::Set(next),
        };
        model.update(db).await?;
        Ok(next)
    }

    /// Appends one immutable ledger row inside the caller's transaction.
    pub(super) async fn append_entry(
        &self,
        db: &DatabaseTransaction,
        entry: &LedgerEntry,
    ) -> ResultEngine<()> {
        ledger::ActiveModel::from(entry).insert(db).await?;
        Ok(())
    }

    fn involving(user_id: &str) -> Condition {
        Condition::any()
            .add(ledger::Column::FromUserId.eq(user_id.to_string()))
            .add(ledger::Column::ToUserId.eq(user_id.to_string()))
    }

    /// Lists ledger entries involving the user, newest first.
    ///
    /// `limit` must be in `1..=200`, otherwise `InvalidPagination`.
    pub async fn list_ledger(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> ResultEngine<LedgerPage> {
        if limit == 0 || limit > MAX_LEDGER_PAGE {
            return Err(EngineError::InvalidPagination(format!(
                "limit must be between 1 and {MAX_LEDGER_PAGE}"
            )));
        }

        let query = ledger::Entity::find().filter(Self::involving(user_id));
        let total = query.clone().count(&self.database).await?;
        let rows = query
            .order_by_desc(ledger::Column::CreatedAt)
            .order_by_desc(ledger::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.database)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(LedgerEntry::try_from(row)?);
        }
        Ok(LedgerPage { entries, total })
    }

    /// Reconstructs a balance by replaying the user's ledger entries in
    /// chronological order, independent of the `accounts` table.
    ///
    /// A committed state always satisfies
    /// `recompute_balance(u) == balance(u)`.
    pub async fn recompute_balance(&self, user_id: &str) -> ResultEngine<i64> {
        let rows = ledger::Entity::find()
            .filter(Self::involving(user_id))
            .order_by_asc(ledger::Column::CreatedAt)
            .order_by_asc(ledger::Column::Id)
            .all(&self.database)
            .await?;

        let mut balance: i64 = 0;
        for row in rows {
            let entry = LedgerEntry::try_from(row)?;
            if entry.from_user_id.as_deref() == Some(user_id) {
                balance = balance.checked_sub(entry.amount).ok_or_else(|| {
                    EngineError::InvalidAmount(format!("balance overflow for {user_id}"))
                })?;
            }
            if entry.to_user_id.as_deref() == Some(user_id) {
                balance = balance.checked_add(entry.amount).ok_or_else(|| {
                    EngineError::InvalidAmount(format!("balance overflow for {user_id}"))
                })?;
            }
        }
        Ok(balance)
    }
}
