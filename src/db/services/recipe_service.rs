//! Storage primitives for recipes and their ingredient/tag join rows.
//!
//! Join-row writers are crate-private: the recipe composer is the only caller
//! allowed to touch `recipe_ingredients` and `recipe_tags`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::db::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use crate::error::AppError;

/// Inclusive bounds shared by `cooking_time` and ingredient `amount`.
pub const MIN_QUANTITY: i32 = 1;
pub const MAX_QUANTITY: i32 = 44640;

pub const MAX_RECIPE_NAME_LEN: usize = 200;

/// One `(ingredient, amount)` line of a recipe as submitted by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// The scalar columns of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFields {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

pub fn check_quantity(field: &str, value: i32) -> Result<(), AppError> {
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&value) {
        return Err(AppError::Validation(format!(
            "{field} must be between {MIN_QUANTITY} and {MAX_QUANTITY}, got {value}"
        )));
    }
    Ok(())
}

fn check_fields(fields: &RecipeFields) -> Result<(), AppError> {
    let name = fields.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("recipe name is required".to_string()));
    }
    if name.chars().count() > MAX_RECIPE_NAME_LEN {
        return Err(AppError::Validation(format!(
            "recipe name must be at most {MAX_RECIPE_NAME_LEN} characters"
        )));
    }
    check_quantity("cooking_time", fields.cooking_time)
}

// --- Recipe rows ---

pub(crate) async fn insert_recipe<C: ConnectionTrait>(
    db: &C,
    author_id: i32,
    fields: &RecipeFields,
) -> Result<recipe::Model, AppError> {
    check_fields(fields)?;

    Ok(recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(fields.name.trim().to_owned()),
        image: Set(fields.image.clone()),
        text: Set(fields.text.clone()),
        cooking_time: Set(fields.cooking_time),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub(crate) async fn update_recipe_fields<C: ConnectionTrait>(
    db: &C,
    existing: recipe::Model,
    fields: &RecipeFields,
) -> Result<recipe::Model, AppError> {
    check_fields(fields)?;

    let mut active = existing.into_active_model();
    active.name = Set(fields.name.trim().to_owned());
    active.image = Set(fields.image.clone());
    active.text = Set(fields.text.clone());
    active.cooking_time = Set(fields.cooking_time);
    active.created_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

pub async fn get_recipe<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<Option<recipe::Model>, AppError> {
    Ok(recipe::Entity::find_by_id(recipe_id).one(db).await?)
}

pub async fn require_recipe<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<recipe::Model, AppError> {
    get_recipe(db, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("recipe {recipe_id} does not exist")))
}

pub async fn get_recipes_by_ids<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<Vec<recipe::Model>, AppError> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(recipe::Entity::find()
        .filter(recipe::Column::Id.is_in(recipe_ids.to_vec()))
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await?)
}

/// Removes a recipe row. Join rows, favorites and cart entries referencing it
/// are dropped by the ON DELETE CASCADE foreign keys.
pub(crate) async fn delete_recipe_row<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<(), AppError> {
    let result = recipe::Entity::delete_by_id(recipe_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("recipe {recipe_id} does not exist")));
    }
    Ok(())
}

// --- Tag join rows ---

/// Associates every tag in `tag_ids` with the recipe. An existing pair is a
/// conflict, never an overwrite.
pub(crate) async fn add_tags<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), AppError> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let rows = tag_ids.iter().map(|tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
    });
    recipe_tag::Entity::insert_many(rows).exec_without_returning(db).await?;
    Ok(())
}

pub(crate) async fn remove_all_tags<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<u64, AppError> {
    let result = recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn get_recipe_tags<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<Vec<tag::Model>, AppError> {
    let rows = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .order_by_asc(recipe_tag::Column::TagId)
        .find_also_related(tag::Entity)
        .all(db)
        .await?;
    Ok(rows.into_iter().filter_map(|(_, tag)| tag).collect())
}

// --- Ingredient join rows ---

/// Writes one row per line, keeping the line index as `position`.
pub(crate) async fn add_ingredient_amounts<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    lines: &[IngredientLine],
) -> Result<(), AppError> {
    if lines.is_empty() {
        return Ok(());
    }
    for line in lines {
        check_quantity("amount", line.amount)?;
    }

    let rows = lines
        .iter()
        .enumerate()
        .map(|(position, line)| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(line.ingredient_id),
            amount: Set(line.amount),
            position: Set(position as i32),
        });
    recipe_ingredient::Entity::insert_many(rows).exec_without_returning(db).await?;
    Ok(())
}

pub(crate) async fn remove_all_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
) -> Result<u64, AppError> {
    let result = recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// The recipe's ingredient rows in line order, each with its ingredient.
pub async fn get_recipe_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
) -> Result<Vec<(recipe_ingredient::Model, ingredient::Model)>, AppError> {
    let rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .order_by_asc(recipe_ingredient::Column::Position)
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(row, ingredient)| ingredient.map(|i| (row, i)))
        .collect())
}
