//! Recipe composer: the only writer of a recipe's ingredient and tag rows.
//!
//! Create and replace both validate the whole draft up front, then write the
//! recipe row and its join rows inside one transaction. Replace clears the
//! old associations and writes the new sets; nothing is merged.

use std::collections::HashSet;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::entities::recipe;
use crate::db::services::recipe_service::{
    self, add_ingredient_amounts, add_tags, check_quantity, delete_recipe_row, insert_recipe,
    remove_all_ingredients, remove_all_tags, update_recipe_fields,
};
use crate::db::services::{require_ingredients, require_recipe, require_tags, require_user};
use crate::error::AppError;

pub use recipe_service::{IngredientLine, RecipeFields};

/// Everything a create or full replace writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDraft {
    #[serde(flatten)]
    pub fields: RecipeFields,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientLine>,
}

fn validate_draft(draft: &RecipeDraft) -> Result<(), AppError> {
    check_quantity("cooking_time", draft.fields.cooking_time)?;

    if draft.ingredients.is_empty() {
        return Err(AppError::Validation(
            "a recipe needs at least one ingredient".to_string(),
        ));
    }
    if draft.tag_ids.is_empty() {
        return Err(AppError::Validation("a recipe needs at least one tag".to_string()));
    }

    let mut seen = HashSet::new();
    for line in &draft.ingredients {
        if !seen.insert(line.ingredient_id) {
            return Err(AppError::Validation(format!(
                "ingredient {} is listed more than once",
                line.ingredient_id
            )));
        }
        check_quantity("amount", line.amount)?;
    }

    let mut seen = HashSet::new();
    for tag_id in &draft.tag_ids {
        if !seen.insert(*tag_id) {
            return Err(AppError::Validation(format!("tag {tag_id} is listed more than once")));
        }
    }
    Ok(())
}

async fn ensure_references_exist<C: ConnectionTrait>(db: &C, draft: &RecipeDraft) -> Result<(), AppError> {
    require_tags(db, &draft.tag_ids).await?;
    let ingredient_ids: Vec<i32> = draft.ingredients.iter().map(|l| l.ingredient_id).collect();
    require_ingredients(db, &ingredient_ids).await?;
    Ok(())
}

async fn write_associations<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    draft: &RecipeDraft,
) -> Result<(), AppError> {
    let result = async {
        add_tags(db, recipe_id, &draft.tag_ids).await?;
        add_ingredient_amounts(db, recipe_id, &draft.ingredients).await
    }
    .await;

    if let Err(AppError::Conflict(reason)) = &result {
        warn!(recipe_id = recipe_id, reason = %reason, "Concurrent write collided on recipe associations.");
    }
    result
}

/// Only the author or a staff user may rewrite or delete a recipe.
async fn authorize<C: ConnectionTrait>(
    db: &C,
    requester_id: i32,
    recipe: &recipe::Model,
) -> Result<(), AppError> {
    let requester = require_user(db, requester_id).await?;
    if requester.id != recipe.author_id && !requester.is_staff {
        return Err(AppError::Forbidden(format!(
            "user {requester_id} may not modify recipe {}",
            recipe.id
        )));
    }
    Ok(())
}

pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    draft: &RecipeDraft,
) -> Result<recipe::Model, AppError> {
    validate_draft(draft)?;

    let txn = db.begin().await?;

    require_user(&txn, author_id).await?;
    ensure_references_exist(&txn, draft).await?;

    let created = insert_recipe(&txn, author_id, &draft.fields).await?;
    write_associations(&txn, created.id, draft).await?;

    txn.commit().await?;

    info!(
        recipe_id = created.id,
        author_id = author_id,
        ingredients = draft.ingredients.len(),
        tags = draft.tag_ids.len(),
        "Created recipe."
    );
    Ok(created)
}

/// Replaces every field, tag and ingredient line of a recipe. On any failure
/// the recipe keeps its previous state.
pub async fn replace_recipe(
    db: &DatabaseConnection,
    requester_id: i32,
    recipe_id: i32,
    draft: &RecipeDraft,
) -> Result<recipe::Model, AppError> {
    validate_draft(draft)?;

    let txn = db.begin().await?;

    let existing = require_recipe(&txn, recipe_id).await?;
    authorize(&txn, requester_id, &existing).await?;
    ensure_references_exist(&txn, draft).await?;

    remove_all_tags(&txn, recipe_id).await?;
    remove_all_ingredients(&txn, recipe_id).await?;
    let updated = update_recipe_fields(&txn, existing, &draft.fields).await?;
    write_associations(&txn, recipe_id, draft).await?;

    txn.commit().await?;

    info!(recipe_id = recipe_id, requester_id = requester_id, "Replaced recipe.");
    Ok(updated)
}

pub async fn delete_recipe(db: &DatabaseConnection, requester_id: i32, recipe_id: i32) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let existing = require_recipe(&txn, recipe_id).await?;
    authorize(&txn, requester_id, &existing).await?;
    delete_recipe_row(&txn, recipe_id).await?;

    txn.commit().await?;

    info!(recipe_id = recipe_id, requester_id = requester_id, "Deleted recipe.");
    Ok(())
}
