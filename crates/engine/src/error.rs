//! The module contains the errors the engine can return.
//!
//! Domain errors ([`InsufficientFunds`], [`SelfTransfer`], [`NotFound`], ...)
//! are deterministic business-rule violations and are never retried.
//! [`Conflict`] is produced only by the transaction coordinator after its
//! retry budget is exhausted; callers must treat it as "temporarily
//! unavailable", not as a domain failure.
//!
//! [`InsufficientFunds`]: EngineError::InsufficientFunds
//! [`SelfTransfer`]: EngineError::SelfTransfer
//! [`NotFound`]: EngineError::NotFound
//! [`Conflict`]: EngineError::Conflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Self transfer: {0}")]
    SelfTransfer(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Already resolved: {0}")]
    AlreadyResolved(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),
    #[error("Transaction conflict, giving up after {0} attempts")]
    Conflict(u32),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::SelfTransfer(a), Self::SelfTransfer(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::AlreadyResolved(a), Self::AlreadyResolved(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::NotAuthorized(a), Self::NotAuthorized(b)) => a == b,
            (Self::InvalidPagination(a), Self::InvalidPagination(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
