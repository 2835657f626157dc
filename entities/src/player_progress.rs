use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per (uid, vid) pair, kept unique by `idx_player_progress_uid_vid`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "player_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub uid: i64,
    pub vid: i64,
    pub percent: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
