//! Comment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub author_id: String,

    /// Parent post ID (exactly one of post_id/essay_id is set)
    #[sea_orm(nullable, indexed)]
    pub post_id: Option<String>,

    /// Parent essay ID (exactly one of post_id/essay_id is set)
    #[sea_orm(nullable, indexed)]
    pub essay_id: Option<String>,

    /// Parent comment ID; null means this is a root comment
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    /// Comment body text
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Signed vote tally (denormalized)
    #[sea_orm(default_value = 0)]
    pub votes: i32,

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

    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id"
    )]
    Post,

    #[sea_orm(
        belongs_to = "super::essay::Entity",
        from = "Column::EssayId",
        to = "super::essay::Column::Id"
    )]
    Essay,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::essay::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Essay.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
