//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub username_lower: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Access token (bearer credential)
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Profile biography
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    /// Avatar URL
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Location
    #[sea_orm(nullable)]
    pub location: Option<String>,

    /// Philosophical interests
    #[sea_orm(column_type = "JsonBinary")]
    pub interests: Json,

    /// Awards/badges earned
    #[sea_orm(column_type = "JsonBinary")]
    pub awards: Json,

    /// Posts count (denormalized, refreshed by the stats sweep)
    #[sea_orm(default_value = 0)]
    pub posts_count: i32,

    /// Essays count (denormalized, refreshed by the stats sweep)
    #[sea_orm(default_value = 0)]
    pub essays_count: i32,

    /// Comments count (denormalized, refreshed by the stats sweep)
    #[sea_orm(default_value = 0)]
    pub comments_count: i32,

    /// Total views across authored content (denormalized)
    #[sea_orm(default_value = 0)]
    pub total_views: i32,

    /// Total insightful marks across authored content (denormalized)
    #[sea_orm(default_value = 0)]
    pub total_insightful: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,

    #[sea_orm(has_many = "super::essay::Entity")]
    Essays,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_one = "super::user_profile::Entity")]
    Profile,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::essay::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Essays.def()
    }
}

impl Related<super::user_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
