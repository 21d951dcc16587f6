//! Coinflip wager API endpoints

use api_types::wager::{
    CoinSide as ApiSide, WagerNew, WagerSettled, WagerStatus as ApiStatus, WagerView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::ProposeWagerCmd;
use uuid::Uuid;

use crate::{
    ServerError,
    server::{Caller, ServerState},
};

fn map_side(side: engine::CoinSide) -> ApiSide {
    match side {
        engine::CoinSide::Heads => ApiSide::Heads,
        engine::CoinSide::Tails => ApiSide::Tails,
    }
}

fn engine_side(side: ApiSide) -> engine::CoinSide {
    match side {
        ApiSide::Heads => engine::CoinSide::Heads,
        ApiSide::Tails => engine::CoinSide::Tails,
    }
}

fn map_status(status: engine::WagerStatus) -> ApiStatus {
    match status {
        engine::WagerStatus::Pending => ApiStatus::Pending,
        engine::WagerStatus::Declined => ApiStatus::Declined,
        engine::WagerStatus::Completed => ApiStatus::Completed,
    }
}

fn map_wager(wager: engine::Wager) -> WagerView {
    WagerView {
        id: wager.id,
        status: map_status(wager.status),
        challenger_id: wager.challenger_id,
        opponent_id: wager.opponent_id,
        bet_amount: wager.bet_amount,
        challenger_side: map_side(wager.challenger_side),
        result_side: wager.result_side.map(map_side),
        winner_id: wager.winner_id,
        created_at: wager.created_at,
        resolved_at: wager.resolved_at,
    }
}

pub async fn propose(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<WagerNew>,
) -> Result<Json<WagerView>, ServerError> {
    let wager = state
        .engine
        .propose_wager(ProposeWagerCmd {
            challenger_id: caller.user_id,
            opponent_id: payload.opponent_id,
            bet_amount: payload.bet_amount,
            challenger_side: engine_side(payload.challenger_side),
            guild_id: payload.guild_id,
            channel_id: payload.channel_id,
            message_id: payload.message_id,
        })
        .await?;

    Ok(Json(map_wager(wager)))
}

pub async fn accept(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WagerSettled>, ServerError> {
    let settlement = state.engine.accept_wager(id, &caller.user_id).await?;

    Ok(Json(WagerSettled {
        wager: map_wager(settlement.wager),
        result_side: map_side(settlement.result_side),
        winner_id: settlement.winner_id,
        loser_id: settlement.loser_id,
        challenger_balance: settlement.challenger_balance.to_string(),
        opponent_balance: settlement.opponent_balance.to_string(),
    }))
}

pub async fn decline(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WagerView>, ServerError> {
    let wager = state.engine.decline_wager(id, &caller.user_id).await?;

    Ok(Json(map_wager(wager)))
}
