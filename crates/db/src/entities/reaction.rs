//! Reaction ledger entity.
//!
//! One row per (user, target) pair recording which reaction the user
//! currently holds. Posts, essays, and comments share this table; the
//! `(user_id, target_type, target_id)` unique index enforces the
//! one-active-reaction invariant at the storage layer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of content a reaction is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "essay")]
    Essay,
    #[sea_orm(string_value = "comment")]
    Comment,
}

/// Reaction label, covering both the labeled and the signed alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReactionKind {
    #[sea_orm(string_value = "insightful")]
    #[serde(rename = "insightful")]
    Insightful,
    #[sea_orm(string_value = "notHelpful")]
    #[serde(rename = "notHelpful")]
    NotHelpful,
    #[sea_orm(string_value = "up")]
    #[serde(rename = "up")]
    Up,
    #[sea_orm(string_value = "down")]
    #[serde(rename = "down")]
    Down,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    pub target_type: TargetType,

    #[sea_orm(indexed)]
    pub target_id: String,

    pub kind: ReactionKind,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
