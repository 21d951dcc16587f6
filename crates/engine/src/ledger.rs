//! Ledger primitives.
//!
//! A `LedgerEntry` is an immutable audit record of a balance-affecting event.
//! Entries are only ever inserted, inside the same transaction as the balance
//! mutation they describe, and are never updated or deleted. Replaying a
//! user's entries reconstructs their balance independently of the `accounts`
//! table.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Transfer,
    AdminAdd,
    AdminRemove,
    CoinflipBet,
    CoinflipPayout,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::AdminAdd => "admin_add",
            Self::AdminRemove => "admin_remove",
            Self::CoinflipBet => "coinflip_bet",
            Self::CoinflipPayout => "coinflip_payout",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transfer" => Ok(Self::Transfer),
            "admin_add" => Ok(Self::AdminAdd),
            "admin_remove" => Ok(Self::AdminRemove),
            "coinflip_bet" => Ok(Self::CoinflipBet),
            "coinflip_payout" => Ok(Self::CoinflipPayout),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid ledger entry kind: {other}"
            ))),
        }
    }
}

/// An immutable audit record of one balance-affecting event.
///
/// A debit-only entry carries `from_user_id`, a credit-only entry carries
/// `to_user_id`, and a transfer carries both in a single row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kind: EntryKind,
    /// Positive amount in the smallest currency unit.
    pub amount: i64,
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
    pub guild_id: Option<String>,
    pub reason: Option<String>,
    /// Set on `coinflip_bet` / `coinflip_payout` entries.
    pub wager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    fn base(kind: EntryKind, amount: i64) -> ResultEngine<Self> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(
                "ledger amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            from_user_id: None,
            to_user_id: None,
            guild_id: None,
            reason: None,
            wager_id: None,
            created_at: Utc::now(),
        })
    }

    /// A full transfer: one row carrying both parties.
    pub fn transfer(
        from_user_id: &str,
        to_user_id: &str,
        amount: i64,
        guild_id: Option<&str>,
        reason: Option<&str>,
    ) -> ResultEngine<Self> {
        let mut entry = Self::base(EntryKind::Transfer, amount)?;
        entry.from_user_id = Some(from_user_id.to_string());
        entry.to_user_id = Some(to_user_id.to_string());
        entry.guild_id = guild_id.map(ToString::to_string);
        entry.reason = reason.map(ToString::to_string);
        Ok(entry)
    }

    /// A credit-only entry (`to_user_id` set).
    pub fn credit(
        kind: EntryKind,
        to_user_id: &str,
        amount: i64,
        guild_id: Option<&str>,
        reason: Option<&str>,
    ) -> ResultEngine<Self> {
        let mut entry = Self::base(kind, amount)?;
        entry.to_user_id = Some(to_user_id.to_string());
        entry.guild_id = guild_id.map(ToString::to_string);
        entry.reason = reason.map(ToString::to_string);
        Ok(entry)
    }

    /// A debit-only entry (`from_user_id` set).
    pub fn debit(
        kind: EntryKind,
        from_user_id: &str,
        amount: i64,
        guild_id: Option<&str>,
        reason: Option<&str>,
    ) -> ResultEngine<Self> {
        let mut entry = Self::base(kind, amount)?;
        entry.from_user_id = Some(from_user_id.to_string());
        entry.guild_id = guild_id.map(ToString::to_string);
        entry.reason = reason.map(ToString::to_string);
        Ok(entry)
    }

    /// Tags the entry with the wager it settles.
    pub fn with_wager(mut self, wager_id: Uuid) -> Self {
        self.wager_id = Some(wager_id);
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub amount: i64,
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
    pub guild_id: Option<String>,
    pub reason: Option<String>,
    pub wager_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount: ActiveValue::Set(entry.amount),
            from_user_id: ActiveValue::Set(entry.from_user_id.clone()),
            to_user_id: ActiveValue::Set(entry.to_user_id.clone()),
            guild_id: ActiveValue::Set(entry.guild_id.clone()),
            reason: ActiveValue::Set(entry.reason.clone()),
            wager_id: ActiveValue::Set(entry.wager_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("ledger entry".to_string()))?,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount: model.amount,
            from_user_id: model.from_user_id,
            to_user_id: model.to_user_id,
            guild_id: model.guild_id,
            reason: model.reason,
            wager_id: model.wager_id.and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: model.created_at,
        })
    }
}
