//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Guilder:
//!
//! - `accounts`: one balance per user
//! - `ledger_entries`: append-only audit records of balance changes
//! - `wagers`: two-party coinflip bets and their resolution state

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    UserId,
    Balance,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    Kind,
    Amount,
    FromUserId,
    ToUserId,
    GuildId,
    Reason,
    WagerId,
    CreatedAt,
}

#[derive(Iden)]
enum Wagers {
    Table,
    Id,
    Status,
    GuildId,
    ChannelId,
    MessageId,
    ChallengerId,
    OpponentId,
    BetAmount,
    ChallengerSide,
    ResultSide,
    WinnerId,
    CreatedAt,
    ResolvedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Ledger entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Kind).string().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::FromUserId).string())
                    .col(ColumnDef::new(LedgerEntries::ToUserId).string())
                    .col(ColumnDef::new(LedgerEntries::GuildId).string())
                    .col(ColumnDef::new(LedgerEntries::Reason).string())
                    .col(ColumnDef::new(LedgerEntries::WagerId).string())
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-from_user_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::FromUserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-to_user_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::ToUserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-wager_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::WagerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-created_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Wagers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Wagers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wagers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wagers::Status).string().not_null())
                    .col(ColumnDef::new(Wagers::GuildId).string())
                    .col(ColumnDef::new(Wagers::ChannelId).string())
                    .col(ColumnDef::new(Wagers::MessageId).string())
                    .col(ColumnDef::new(Wagers::ChallengerId).string().not_null())
                    .col(ColumnDef::new(Wagers::OpponentId).string().not_null())
                    .col(ColumnDef::new(Wagers::BetAmount).big_integer().not_null())
                    .col(ColumnDef::new(Wagers::ChallengerSide).string().not_null())
                    .col(ColumnDef::new(Wagers::ResultSide).string())
                    .col(ColumnDef::new(Wagers::WinnerId).string())
                    .col(ColumnDef::new(Wagers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Wagers::ResolvedAt).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wagers-status")
                    .table(Wagers::Table)
                    .col(Wagers::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wagers-opponent_id-status")
                    .table(Wagers::Table)
                    .col(Wagers::OpponentId)
                    .col(Wagers::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Wagers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
