//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post kinds.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[sea_orm(string_value = "question")]
    Question,
    #[sea_orm(string_value = "discussion")]
    Discussion,
}

/// Content categories shared by posts and essays.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Category {
    #[sea_orm(string_value = "Ethics")]
    Ethics,
    #[sea_orm(string_value = "Metaphysics")]
    Metaphysics,
    #[sea_orm(string_value = "Epistemology")]
    Epistemology,
    #[sea_orm(string_value = "Political Philosophy")]
    #[serde(rename = "Political Philosophy")]
    PoliticalPhilosophy,
    #[sea_orm(string_value = "Philosophy of Mind")]
    #[serde(rename = "Philosophy of Mind")]
    PhilosophyOfMind,
    #[sea_orm(string_value = "Philosophy of Religion")]
    #[serde(rename = "Philosophy of Religion")]
    PhilosophyOfReligion,
    #[sea_orm(string_value = "Aesthetics")]
    Aesthetics,
    #[sea_orm(string_value = "Logic")]
    Logic,
    #[sea_orm(string_value = "Eastern Philosophy")]
    #[serde(rename = "Eastern Philosophy")]
    EasternPhilosophy,
    #[sea_orm(string_value = "Other")]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    pub title: String,

    /// Post body text
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Question or discussion
    pub kind: PostKind,

    pub category: Category,

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
