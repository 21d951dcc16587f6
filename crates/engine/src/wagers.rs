//! Wager (coinflip) primitives.
//!
//! A `Wager` is a two-party, single-settlement bet. It is created `pending`
//! by the challenger and moves exactly once to either `declined` or
//! `completed`, both terminal. Only the opponent may resolve it, and the
//! transition is guarded by a status re-read inside the same transaction
//! that performs the mutation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heads => "heads",
            Self::Tails => "tails",
        }
    }
}

impl TryFrom<&str> for CoinSide {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "heads" => Ok(Self::Heads),
            "tails" => Ok(Self::Tails),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid coin side: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WagerStatus {
    Pending,
    Declined,
    Completed,
}

impl WagerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Declined => "declined",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for WagerStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "declined" => Ok(Self::Declined),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid wager status: {other}"
            ))),
        }
    }
}

/// A two-party coinflip wager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    pub id: Uuid,
    pub status: WagerStatus,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
    pub challenger_id: String,
    pub opponent_id: String,
    /// Stake per party, in the smallest currency unit. Positive.
    pub bet_amount: i64,
    pub challenger_side: CoinSide,
    pub result_side: Option<CoinSide>,
    pub winner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Wager {
    /// Creates a `pending` wager. No funds are touched or reserved here;
    /// funds are validated at settlement time.
    pub fn new(
        challenger_id: String,
        opponent_id: String,
        bet_amount: i64,
        challenger_side: CoinSide,
        guild_id: Option<String>,
        channel_id: Option<String>,
        message_id: Option<String>,
    ) -> ResultEngine<Self> {
        if challenger_id == opponent_id {
            return Err(EngineError::SelfTransfer(
                "challenger and opponent must differ".to_string(),
            ));
        }
        if bet_amount <= 0 {
            return Err(EngineError::InvalidAmount(
                "bet_amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            status: WagerStatus::Pending,
            guild_id,
            channel_id,
            message_id,
            challenger_id,
            opponent_id,
            bet_amount,
            challenger_side,
            result_side: None,
            winner_id: None,
            created_at: Utc::now(),
            resolved_at: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wagers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub status: String,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
    pub challenger_id: String,
    pub opponent_id: String,
    pub bet_amount: i64,
    pub challenger_side: String,
    pub result_side: Option<String>,
    pub winner_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wager> for ActiveModel {
    fn from(wager: &Wager) -> Self {
        Self {
            id: ActiveValue::Set(wager.id.to_string()),
            status: ActiveValue::Set(wager.status.as_str().to_string()),
            guild_id: ActiveValue::Set(wager.guild_id.clone()),
            channel_id: ActiveValue::Set(wager.channel_id.clone()),
            message_id: ActiveValue::Set(wager.message_id.clone()),
            challenger_id: ActiveValue::Set(wager.challenger_id.clone()),
            opponent_id: ActiveValue::Set(wager.opponent_id.clone()),
            bet_amount: ActiveValue::Set(wager.bet_amount),
            challenger_side: ActiveValue::Set(wager.challenger_side.as_str().to_string()),
            result_side: ActiveValue::Set(wager.result_side.map(|s| s.as_str().to_string())),
            winner_id: ActiveValue::Set(wager.winner_id.clone()),
            created_at: ActiveValue::Set(wager.created_at),
            resolved_at: ActiveValue::Set(wager.resolved_at),
        }
    }
}

impl TryFrom<Model> for Wager {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("wager".to_string()))?,
            status: WagerStatus::try_from(model.status.as_str())?,
            guild_id: model.guild_id,
            channel_id: model.channel_id,
            message_id: model.message_id,
            challenger_id: model.challenger_id,
            opponent_id: model.opponent_id,
            bet_amount: model.bet_amount,
            challenger_side: CoinSide::try_from(model.challenger_side.as_str())?,
            result_side: model
                .result_side
                .as_deref()
                .map(CoinSide::try_from)
                .transpose()?,
            winner_id: model.winner_id,
            created_at: model.created_at,
            resolved_at: model.resolved_at,
        })
    }
}
