//! Privileged adjustment API endpoints

use api_types::account::BalanceResponse;
use api_types::admin::AdminAdjust;
use axum::{Extension, Json, extract::State};
use engine::AdminAdjustCmd;

use crate::{
    ServerError,
    server::{Caller, ServerState},
};

fn adjust_cmd(caller: Caller, payload: AdminAdjust) -> AdminAdjustCmd {
    AdminAdjustCmd {
        operator_id: caller.user_id,
        operator: caller.operator,
        target_user_id: payload.target_user_id,
        amount: payload.amount,
        guild_id: payload.guild_id,
        reason: payload.reason,
    }
}

pub async fn add(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<AdminAdjust>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let cmd = adjust_cmd(caller, payload);
    let target = cmd.target_user_id.clone();
    let balance = state.engine.admin_add(cmd).await?;

    Ok(Json(BalanceResponse {
        user_id: target,
        balance: balance.to_string(),
    }))
}

pub async fn remove(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<AdminAdjust>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let cmd = adjust_cmd(caller, payload);
    let target = cmd.target_user_id.clone();
    let balance = state.engine.admin_remove(cmd).await?;

    Ok(Json(BalanceResponse {
        user_id: target,
        balance: balance.to_string(),
    }))
}
