use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    /// Response body for a balance lookup or a privileged adjustment.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub user_id: String,
        /// Balance in the smallest currency unit, serialized as a decimal
        /// string so JSON consumers never round it.
        pub balance: String,
    }
}

pub mod ledger {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Transfer,
        AdminAdd,
        AdminRemove,
        CoinflipBet,
        CoinflipPayout,
    }

    /// Query parameters for listing a user's ledger entries.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerList {
        /// Page size, `1..=200`. Defaults to 50.
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerEntryView {
        pub id: Uuid,
        pub kind: EntryKind,
        /// Positive amount in the smallest currency unit.
        pub amount: i64,
        pub from_user_id: Option<String>,
        pub to_user_id: Option<String>,
        pub guild_id: Option<String>,
        pub reason: Option<String>,
        pub wager_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerListResponse {
        pub entries: Vec<LedgerEntryView>,
        /// Total matching entries, across all pages.
        pub total: u64,
    }
}

pub mod transfer {
    use super::*;

    /// Request body for a peer transfer. The sender is the authenticated
    /// caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub to_user_id: String,
        /// Must be > 0, in the smallest currency unit.
        pub amount: i64,
        pub guild_id: Option<String>,
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferResponse {
        pub from_balance: String,
        pub to_balance: String,
    }
}

pub mod admin {
    use super::*;

    /// Request body for a privileged balance adjustment. The operator is the
    /// authenticated caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminAdjust {
        pub target_user_id: String,
        /// Must be > 0, in the smallest currency unit.
        pub amount: i64,
        pub guild_id: Option<String>,
        pub reason: Option<String>,
    }
}

pub mod wager {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CoinSide {
        Heads,
        Tails,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WagerStatus {
        Pending,
        Declined,
        Completed,
    }

    /// Request body for proposing a coinflip. The challenger is the
    /// authenticated caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WagerNew {
        pub opponent_id: String,
        /// Stake per party, must be > 0, in the smallest currency unit.
        pub bet_amount: i64,
        pub challenger_side: CoinSide,
        pub guild_id: Option<String>,
        pub channel_id: Option<String>,
        pub message_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WagerView {
        pub id: Uuid,
        pub status: WagerStatus,
        pub challenger_id: String,
        pub opponent_id: String,
        pub bet_amount: i64,
        pub challenger_side: CoinSide,
        pub result_side: Option<CoinSide>,
        pub winner_id: Option<String>,
        pub created_at: DateTime<Utc>,
        pub resolved_at: Option<DateTime<Utc>>,
    }

    /// Response body for an accepted (settled) wager.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WagerSettled {
        pub wager: WagerView,
        pub result_side: CoinSide,
        pub winner_id: String,
        pub loser_id: String,
        pub challenger_balance: String,
        pub opponent_balance: String,
    }
}
