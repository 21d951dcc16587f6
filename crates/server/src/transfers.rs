//! Peer transfer API endpoint

use api_types::transfer::{TransferNew, TransferResponse};
use axum::{Extension, Json, extract::State};
use engine::TransferCmd;

use crate::{
    ServerError,
    server::{Caller, ServerState},
};

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<Json<TransferResponse>, ServerError> {
    let outcome = state
        .engine
        .transfer(TransferCmd {
            from_user_id: caller.user_id,
            to_user_id: payload.to_user_id,
            amount: payload.amount,
            guild_id: payload.guild_id,
            reason: payload.reason,
        })
        .await?;

    Ok(Json(TransferResponse {
        from_balance: outcome.from_balance.to_string(),
        to_balance: outcome.to_balance.to_string(),
    }))
}
