//! Essay entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::post::Category;

/// Essay kinds.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EssayKind {
    #[sea_orm(string_value = "essay")]
    Essay,
    #[sea_orm(string_value = "reflection")]
    Reflection,
    #[sea_orm(string_value = "dialogue")]
    Dialogue,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "essay")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    pub title: String,

    /// Essay body text
    #[sea_orm(column_type = "Text")]
    pub body: String,

    pub kind: EssayKind,

    pub category: Category,

    /// Unpublished essays are only visible to their author
    #[sea_orm(default_value = true)]
    pub published: bool,

    /// Insightful reaction count (denormalized)
    #[sea_orm(default_value = 0)]
    pub insightful: i32,

    /// Not-helpful reaction count (denormalized)
    #[sea_orm(default_value = 0)]
    pub not_helpful: i32,

    /// View count, bumped on each detail fetch
    #[sea_orm(default_value = 0)]
    pub views: i32,

    /// Comment count (denormalized, includes replies)
    #[sea_orm(default_value = 0)]
    pub comment_count: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
