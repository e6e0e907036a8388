//! Read-side queries: filtered recipe listing and the detailed recipe view
//! with per-viewer flags.

use std::collections::BTreeSet;

use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::entities::{recipe, recipe_tag, tag, user};
use crate::db::services::{
    cart_recipe_ids, favorite_recipe_ids, find_tags_by_slugs, get_cart_for_user,
    get_recipe_ingredients, get_recipe_tags, require_recipe, require_user,
};
use crate::error::AppError;
use crate::membership::{RelationKind, membership_state};

/// Listing filters. Every set filter narrows the result; `tag_slugs` matches
/// recipes carrying any of the listed tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeFilter {
    pub author_id: Option<i32>,
    #[serde(default)]
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: recipe::Model,
    pub author: user::Model,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Recipes matching every set filter, newest first.
pub async fn search_recipes<C: ConnectionTrait>(
    db: &C,
    filter: &RecipeFilter,
) -> Result<Vec<recipe::Model>, AppError> {
    let mut condition = Condition::all();

    if let Some(author_id) = filter.author_id {
        condition = condition.add(recipe::Column::AuthorId.eq(author_id));
    }

    if !filter.tag_slugs.is_empty() {
        let tag_ids: Vec<i32> = find_tags_by_slugs(db, &filter.tag_slugs)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let tagged: BTreeSet<i32> = recipe_tag::Entity::find()
            .select_only()
            .column(recipe_tag::Column::RecipeId)
            .filter(recipe_tag::Column::TagId.is_in(tag_ids))
            .into_tuple::<i32>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        condition = condition.add(recipe::Column::Id.is_in(tagged));
    }

    if let Some(user_id) = filter.favorited_by {
        let ids = favorite_recipe_ids(db, user_id).await?;
        condition = condition.add(recipe::Column::Id.is_in(ids));
    }

    if let Some(user_id) = filter.in_cart_of {
        let ids = match get_cart_for_user(db, user_id).await? {
            Some(cart) => cart_recipe_ids(db, cart.id).await?,
            None => Vec::new(),
        };
        condition = condition.add(recipe::Column::Id.is_in(ids));
    }

    let recipes = recipe::Entity::find()
        .filter(condition)
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await?;

    debug!(filter = ?filter, count = recipes.len(), "Searched recipes.");
    Ok(recipes)
}

/// The full view of one recipe. Flags are computed for `viewer`; an anonymous
/// viewer sees both as false.
pub async fn recipe_details<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    viewer: Option<i32>,
) -> Result<RecipeDetails, AppError> {
    let recipe = require_recipe(db, recipe_id).await?;

    let (author, tags, lines) = futures::try_join!(
        require_user(db, recipe.author_id),
        get_recipe_tags(db, recipe_id),
        get_recipe_ingredients(db, recipe_id),
    )?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer_id) => {
            let (favorite, cart) = futures::try_join!(
                membership_state(db, RelationKind::Favorite, viewer_id, recipe_id),
                membership_state(db, RelationKind::Cart, viewer_id, recipe_id),
            )?;
            (favorite.is_present(), cart.is_present())
        }
        None => (false, false),
    };

    let ingredients = lines
        .into_iter()
        .map(|(row, ingredient)| IngredientAmount {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount: row.amount,
        })
        .collect();

    Ok(RecipeDetails {
        recipe,
        author,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    })
}
