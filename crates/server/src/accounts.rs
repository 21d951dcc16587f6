//! Balance and ledger API endpoints

use api_types::account::BalanceResponse;
use api_types::ledger::{EntryKind as ApiKind, LedgerEntryView, LedgerList, LedgerListResponse};
use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{
    ServerError,
    server::{Caller, ServerState},
};

fn map_kind(kind: engine::EntryKind) -> ApiKind {
    match kind {
        engine::EntryKind::Transfer => ApiKind::Transfer,
        engine::EntryKind::AdminAdd => ApiKind::AdminAdd,
        engine::EntryKind::AdminRemove => ApiKind::AdminRemove,
        engine::EntryKind::CoinflipBet => ApiKind::CoinflipBet,
        engine::EntryKind::CoinflipPayout => ApiKind::CoinflipPayout,
    }
}

fn map_entry(entry: engine::LedgerEntry) -> LedgerEntryView {
    LedgerEntryView {
        id: entry.id,
        kind: map_kind(entry.kind),
        amount: entry.amount,
        from_user_id: entry.from_user_id,
        to_user_id: entry.to_user_id,
        guild_id: entry.guild_id,
        reason: entry.reason,
        wager_id: entry.wager_id,
        created_at: entry.created_at,
    }
}

pub async fn get_balance(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let balance = state.engine.balance(&caller.user_id).await?;

    Ok(Json(BalanceResponse {
        user_id: caller.user_id,
        balance: balance.to_string(),
    }))
}

pub async fn list_transactions(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Query(payload): Query<LedgerList>,
) -> Result<Json<LedgerListResponse>, ServerError> {
    let limit = payload.limit.unwrap_or(50);
    let offset = payload.offset.unwrap_or(0);

    let page = state
        .engine
        .list_ledger(&caller.user_id, limit, offset)
        .await?;

    Ok(Json(LedgerListResponse {
        entries: page.entries.into_iter().map(map_entry).collect(),
        total: page.total,
    }))
}
