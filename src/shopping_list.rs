//! Shopping list aggregation over a user's cart.
//!
//! Ingredient totals are grouped by ingredient id, never by name, so two
//! distinct ingredients that happen to share a name stay on separate lines.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::info;

use crate::db::entities::{ingredient, recipe_ingredient};
use crate::db::services::{cart_recipe_ids, get_cart_for_user};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateLine {
    pub ingredient: ingredient::Model,
    pub total_amount: i64,
}

/// Ingredient totals for one cart, in first-encountered order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    pub cart_id: i32,
    lines: IndexMap<i32, AggregateLine>,
}

impl ShoppingList {
    fn new(cart_id: i32) -> Self {
        ShoppingList {
            cart_id,
            lines: IndexMap::new(),
        }
    }

    fn add(&mut self, ingredient: ingredient::Model, amount: i32) {
        self.lines
            .entry(ingredient.id)
            .or_insert_with(|| AggregateLine {
                ingredient,
                total_amount: 0,
            })
            .total_amount += i64::from(amount);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn get(&self, ingredient_id: i32) -> Option<&AggregateLine> {
        self.lines.get(&ingredient_id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &AggregateLine> {
        self.lines.values()
    }
}

/// Sums ingredient amounts across every recipe in the user's cart.
///
/// Recipes are visited in ascending id order and each recipe's lines in the
/// order they were written, which fixes the output order for a given state of
/// the store. An empty cart yields an empty list; a user without a cart is an
/// error.
pub async fn build_aggregate<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<ShoppingList, AppError> {
    let cart = get_cart_for_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no shopping cart".to_string()))?;

    let mut list = ShoppingList::new(cart.id);

    let recipe_ids = cart_recipe_ids(db, cart.id).await?;
    if recipe_ids.is_empty() {
        return Ok(list);
    }

    let rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
        .order_by_asc(recipe_ingredient::Column::RecipeId)
        .order_by_asc(recipe_ingredient::Column::Position)
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;

    for (row, ingredient) in rows {
        if let Some(ingredient) = ingredient {
            list.add(ingredient, row.amount);
        }
    }
    Ok(list)
}

/// One `"<name> - (<unit>) - <total>."` line per ingredient, each
/// newline-terminated, with no header or footer.
pub fn render_report(list: &ShoppingList) -> String {
    let mut out = String::new();
    for line in list.lines() {
        let _ = writeln!(
            out,
            "{} - ({}) - {}.",
            line.ingredient.name, line.ingredient.measurement_unit, line.total_amount
        );
    }
    out
}

/// Writes the rendered report to `<dir>/<cart_id>_SC.txt`.
pub async fn export_report<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    dir: &Path,
) -> Result<PathBuf, AppError> {
    let list = build_aggregate(db, user_id).await?;
    let path = dir.join(format!("{}_SC.txt", list.cart_id));
    tokio::fs::write(&path, render_report(&list)).await?;

    info!(user_id, cart_id = list.cart_id, lines = list.len(), path = ?path, "Exported shopping list.");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{IngredientLine, RecipeDraft, RecipeFields, create_recipe, delete_recipe};
    use crate::db::entities::{cart, recipe};
    use crate::db::test_support::{create_test_ingredient, create_test_tag, create_test_user, setup_db};
    use crate::error::ErrorKind;
    use crate::membership::{MembershipState, RelationKind, toggle};
    use sea_orm::DatabaseConnection;

    async fn recipe_with(
        db: &DatabaseConnection,
        author_id: i32,
        tag_id: i32,
        name: &str,
        lines: &[(i32, i32)],
    ) -> recipe::Model {
        create_recipe(
            db,
            author_id,
            &RecipeDraft {
                fields: RecipeFields {
                    name: name.to_string(),
                    image: String::new(),
                    text: "Cook it.".to_string(),
                    cooking_time: 30,
                },
                tag_ids: vec![tag_id],
                ingredients: lines
                    .iter()
                    .map(|(ingredient_id, amount)| IngredientLine {
                        ingredient_id: *ingredient_id,
                        amount: *amount,
                    })
                    .collect(),
            },
        )
        .await
        .unwrap()
    }

    async fn put_in_cart(db: &DatabaseConnection, user_id: i32, recipe_id: i32) {
        toggle(db, RelationKind::Cart, user_id, recipe_id, MembershipState::Present)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sums_shared_ingredient() {
        let db = setup_db().await;
        let cook = create_test_user(&db, "cook").await;
        let tag = create_test_tag(&db, "soup").await;
        let onion = create_test_ingredient(&db, "onion", "g").await;
        let water = create_test_ingredient(&db, "water", "ml").await;

        let first = recipe_with(&db, cook.id, tag.id, "broth", &[(onion.id, 100), (water.id, 500)]).await;
        let second = recipe_with(&db, cook.id, tag.id, "stew", &[(onion.id, 250)]).await;
        put_in_cart(&db, cook.id, first.id).await;
        put_in_cart(&db, cook.id, second.id).await;

        let list = build_aggregate(&db, cook.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(onion.id).unwrap().total_amount, 350);
        assert_eq!(list.get(water.id).unwrap().total_amount, 500);

        let report = render_report(&list);
        assert_eq!(report, "onion - (g) - 350.\nwater - (ml) - 500.\n");
        assert!(report.lines().any(|l| l == "onion - (g) - 350."));
    }

    #[tokio::test]
    async fn test_empty_cart_is_empty_list() {
        let db = setup_db().await;
        let cook = create_test_user(&db, "cook").await;

        let list = build_aggregate(&db, cook.id).await.unwrap();
        assert!(list.is_empty());
        assert_eq!(render_report(&list), "");
    }

    #[tokio::test]
    async fn test_missing_cart_is_not_found() {
        let db = setup_db().await;
        let cook = create_test_user(&db, "cook").await;
        cart::Entity::delete_many().exec(&db).await.unwrap();

        let err = build_aggregate(&db, cook.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.reason(), "no shopping cart");
    }

    #[tokio::test]
    async fn test_same_name_different_ingredients_not_merged() {
        let db = setup_db().await;
        let cook = create_test_user(&db, "cook").await;
        let tag = create_test_tag(&db, "baking").await;
        let sugar_g = create_test_ingredient(&db, "sugar", "g").await;
        let sugar_tbsp = create_test_ingredient(&db, "sugar", "tbsp").await;

        let cake = recipe_with(&db, cook.id, tag.id, "cake", &[(sugar_g.id, 200), (sugar_tbsp.id, 2)]).await;
        put_in_cart(&db, cook.id, cake.id).await;

        let list = build_aggregate(&db, cook.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(
            render_report(&list),
            "sugar - (g) - 200.\nsugar - (tbsp) - 2.\n"
        );
    }

    #[tokio::test]
    async fn test_order_is_first_encountered_and_stable() {
        let db = setup_db().await;
        let cook = create_test_user(&db, "cook").await;
        let tag = create_test_tag(&db, "mix").await;
        let zucchini = create_test_ingredient(&db, "zucchini", "pcs").await;
        let apple = create_test_ingredient(&db, "apple", "pcs").await;
        let milk = create_test_ingredient(&db, "milk", "ml").await;

        let first = recipe_with(&db, cook.id, tag.id, "one", &[(zucchini.id, 1), (apple.id, 2)]).await;
        let second = recipe_with(&db, cook.id, tag.id, "two", &[(milk.id, 100), (zucchini.id, 3)]).await;
        // Added to the cart in reverse; order follows recipe ids.
        put_in_cart(&db, cook.id, second.id).await;
        put_in_cart(&db, cook.id, first.id).await;

        let expected = "zucchini - (pcs) - 4.\napple - (pcs) - 2.\nmilk - (ml) - 100.\n";
        let report = render_report(&build_aggregate(&db, cook.id).await.unwrap());
        assert_eq!(report, expected);
        let again = render_report(&build_aggregate(&db, cook.id).await.unwrap());
        assert_eq!(again, expected);
    }

    #[tokio::test]
    async fn test_deleted_recipe_drops_out_of_cart() {
        let db = setup_db().await;
        let cook = create_test_user(&db, "cook").await;
        let tag = create_test_tag(&db, "soup").await;
        let onion = create_test_ingredient(&db, "onion", "g").await;

        let broth = recipe_with(&db, cook.id, tag.id, "broth", &[(onion.id, 100)]).await;
        put_in_cart(&db, cook.id, broth.id).await;
        delete_recipe(&db, cook.id, broth.id).await.unwrap();

        assert!(build_aggregate(&db, cook.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_writes_cart_file() {
        let db = setup_db().await;
        let cook = create_test_user(&db, "cook").await;
        let tag = create_test_tag(&db, "soup").await;
        let onion = create_test_ingredient(&db, "onion", "g").await;
        let broth = recipe_with(&db, cook.id, tag.id, "broth", &[(onion.id, 100)]).await;
        put_in_cart(&db, cook.id, broth.id).await;

        let dir = tempfile::tempdir().unwrap();
        let path = export_report(&db, cook.id, dir.path()).await.unwrap();

        let cart_id = build_aggregate(&db, cook.id).await.unwrap().cart_id;
        assert_eq!(path, dir.path().join(format!("{cart_id}_SC.txt")));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "onion - (g) - 100.\n");
    }
}
