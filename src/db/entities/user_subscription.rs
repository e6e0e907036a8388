use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `follower_id` follows `author_id`. The two never coincide.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub follower_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub author_id: i32,
    pub subscribed_at: ChronoDateTimeUtc,
}

// Both sides point at `users`, so the FK names are spelled out.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FollowerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade",
        fk_name = "fk-user_subscriptions-follower_id"
    )]
    Follower,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade",
        fk_name = "fk-user_subscriptions-author_id"
    )]
    Author,
}

impl ActiveModelBehavior for ActiveModel {}
