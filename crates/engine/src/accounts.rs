//! Account persistence.
//!
//! One balance row per external user id, in the smallest currency unit and
//! non-negative at every committed state. Accounts are created lazily with a
//! zero balance the first time a mutating operation touches them and are
//! never deleted. Balance reads for ids that were never touched answer 0
//! without creating a row.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
