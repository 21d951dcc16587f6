//! Virtual-currency ledger and wagering engine.
//!
//! Tracks one balance per user, moves funds between users (peer transfer,
//! privileged admin adjustment, two-party coinflip wagers) and records every
//! balance-affecting event in an append-only ledger. All mutations run inside
//! a serializable transaction via the coordinator in [`ops`], which retries
//! store-level conflicts and never retries domain errors.

pub use error::EngineError;
pub use ledger::{EntryKind, LedgerEntry};
pub use ops::{
    AdminAdjustCmd, Engine, EngineBuilder, LedgerPage, ProposeWagerCmd, TransferCmd,
    TransferOutcome, WagerSettlement,
};
pub use wagers::{CoinSide, Wager, WagerStatus};

mod accounts;
mod error;
mod ledger;
mod ops;
mod wagers;

type ResultEngine<T> = Result<T, EngineError>;
