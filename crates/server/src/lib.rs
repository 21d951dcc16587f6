use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{Caller, app, run, run_with_listener, spawn_with_listener};

mod accounts;
mod admin;
mod server;
mod transfers;
mod wagers;

pub mod types {
    pub mod account {
        pub use api_types::account::BalanceResponse;
    }

    pub mod ledger {
        pub use api_types::ledger::{LedgerEntryView, LedgerList, LedgerListResponse};
    }

    pub mod transfer {
        pub use api_types::transfer::{TransferNew, TransferResponse};
    }

    pub mod admin {
        pub use api_types::admin::AdminAdjust;
    }

    pub mod wager {
        pub use api_types::wager::{WagerNew, WagerSettled, WagerView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) | EngineError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AlreadyResolved(_) => StatusCode::CONFLICT,
        EngineError::Conflict(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientFunds(_)
        | EngineError::InvalidAmount(_)
        | EngineError::SelfTransfer(_)
        | EngineError::InvalidPagination(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Conflict(attempts) => {
            tracing::warn!(attempts, "transaction conflict exhausted retries");
            "temporarily unavailable, retry later".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
