//! Storage primitives for the user-owned membership relations: favorites,
//! subscriptions and cart items.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::db::entities::{cart_item, recipe, user, user_favorite, user_subscription};
use crate::error::AppError;

// --- Favorites ---

pub async fn is_favorite<C: ConnectionTrait>(db: &C, user_id: i32, recipe_id: i32) -> Result<bool, AppError> {
    Ok(user_favorite::Entity::find_by_id((user_id, recipe_id))
        .one(db)
        .await?
        .is_some())
}

pub async fn add_favorite<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
    note: Option<String>,
) -> Result<user_favorite::Model, AppError> {
    Ok(user_favorite::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        note: Set(note),
    }
    .insert(db)
    .await?)
}

pub async fn remove_favorite<C: ConnectionTrait>(db: &C, user_id: i32, recipe_id: i32) -> Result<u64, AppError> {
    let result = user_favorite::Entity::delete_by_id((user_id, recipe_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn favorite_recipe_ids<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<i32>, AppError> {
    Ok(user_favorite::Entity::find()
        .select_only()
        .column(user_favorite::Column::RecipeId)
        .filter(user_favorite::Column::UserId.eq(user_id))
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

/// Recipes the user has favorited, newest first.
pub async fn list_favorites<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<recipe::Model>, AppError> {
    let ids = favorite_recipe_ids(db, user_id).await?;
    super::get_recipes_by_ids(db, &ids).await
}

// --- Subscriptions ---

pub async fn is_subscribed<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    author_id: i32,
) -> Result<bool, AppError> {
    Ok(user_subscription::Entity::find_by_id((follower_id, author_id))
        .one(db)
        .await?
        .is_some())
}

pub async fn add_subscription<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    author_id: i32,
) -> Result<user_subscription::Model, AppError> {
    if follower_id == author_id {
        return Err(AppError::Validation("cannot subscribe to yourself".to_string()));
    }
    Ok(user_subscription::ActiveModel {
        follower_id: Set(follower_id),
        author_id: Set(author_id),
        subscribed_at: Set(Utc::now()),
    }
    .insert(db)
    .await?)
}

pub async fn remove_subscription<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    author_id: i32,
) -> Result<u64, AppError> {
    let result = user_subscription::Entity::delete_by_id((follower_id, author_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Authors followed by `follower_id`, most recent subscription first.
pub async fn list_subscriptions<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
) -> Result<Vec<user::Model>, AppError> {
    let subscriptions = user_subscription::Entity::find()
        .filter(user_subscription::Column::FollowerId.eq(follower_id))
        .order_by_desc(user_subscription::Column::SubscribedAt)
        .order_by_desc(user_subscription::Column::AuthorId)
        .all(db)
        .await?;
    if subscriptions.is_empty() {
        return Ok(Vec::new());
    }

    let author_ids: Vec<i32> = subscriptions.iter().map(|s| s.author_id).collect();
    let mut authors = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids.clone()))
        .all(db)
        .await?;
    authors.sort_by_key(|a| author_ids.iter().position(|id| *id == a.id));
    Ok(authors)
}

// --- Cart items ---

pub async fn is_in_cart<C: ConnectionTrait>(db: &C, cart_id: i32, recipe_id: i32) -> Result<bool, AppError> {
    Ok(cart_item::Entity::find_by_id((cart_id, recipe_id))
        .one(db)
        .await?
        .is_some())
}

pub async fn add_cart_item<C: ConnectionTrait>(
    db: &C,
    cart_id: i32,
    recipe_id: i32,
) -> Result<cart_item::Model, AppError> {
    Ok(cart_item::ActiveModel {
        cart_id: Set(cart_id),
        recipe_id: Set(recipe_id),
    }
    .insert(db)
    .await?)
}

pub async fn remove_cart_item<C: ConnectionTrait>(db: &C, cart_id: i32, recipe_id: i32) -> Result<u64, AppError> {
    let result = cart_item::Entity::delete_by_id((cart_id, recipe_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Recipe ids in the cart, ascending.
pub async fn cart_recipe_ids<C: ConnectionTrait>(db: &C, cart_id: i32) -> Result<Vec<i32>, AppError> {
    Ok(cart_item::Entity::find()
        .select_only()
        .column(cart_item::Column::RecipeId)
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::RecipeId)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

pub async fn count_cart_references<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<u64, AppError> {
    Ok(cart_item::Entity::find()
        .filter(cart_item::Column::RecipeId.eq(recipe_id))
        .count(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::get_cart_for_user;
    use crate::db::test_support::{create_test_user, setup_db};
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_subscription_pair_is_unique() {
        let db = setup_db().await;
        let alice = create_test_user(&db, "alice").await;
        let bob = create_test_user(&db, "bob").await;

        add_subscription(&db, alice.id, bob.id).await.unwrap();
        let err = add_subscription(&db, alice.id, bob.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // The reverse direction is a distinct pair.
        add_subscription(&db, bob.id, alice.id).await.unwrap();
        assert!(is_subscribed(&db, bob.id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_subscription_rejected_by_store() {
        let db = setup_db().await;
        let alice = create_test_user(&db, "alice").await;
        let err = add_subscription(&db, alice.id, alice.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_list_subscriptions_newest_first() {
        let db = setup_db().await;
        let alice = create_test_user(&db, "alice").await;
        let bob = create_test_user(&db, "bob").await;
        let carol = create_test_user(&db, "carol").await;

        add_subscription(&db, alice.id, bob.id).await.unwrap();
        add_subscription(&db, alice.id, carol.id).await.unwrap();

        let authors: Vec<String> = list_subscriptions(&db, alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(authors, vec!["carol".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_missing_cart_item_affects_nothing() {
        let db = setup_db().await;
        let alice = create_test_user(&db, "alice").await;
        let cart = get_cart_for_user(&db, alice.id).await.unwrap().unwrap();

        assert_eq!(remove_cart_item(&db, cart.id, 5).await.unwrap(), 0);
        assert!(cart_recipe_ids(&db, cart.id).await.unwrap().is_empty());
    }
}
