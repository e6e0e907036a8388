use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::entities::ingredient;
use crate::error::AppError;

// --- Ingredient Service Functions ---

pub async fn create_ingredient<C: ConnectionTrait>(
    db: &C,
    name: &str,
    measurement_unit: &str,
) -> Result<ingredient::Model, AppError> {
    if name.trim().is_empty() || measurement_unit.trim().is_empty() {
        return Err(AppError::Validation(
            "ingredient name and measurement unit are required".to_string(),
        ));
    }

    Ok(ingredient::ActiveModel {
        name: Set(name.to_owned()),
        measurement_unit: Set(measurement_unit.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn get_ingredient<C: ConnectionTrait>(
    db: &C,
    ingredient_id: i32,
) -> Result<Option<ingredient::Model>, AppError> {
    Ok(ingredient::Entity::find_by_id(ingredient_id).one(db).await?)
}

pub async fn list_ingredients<C: ConnectionTrait>(db: &C) -> Result<Vec<ingredient::Model>, AppError> {
    Ok(ingredient::Entity::find()
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await?)
}

/// Ingredients whose name starts with `prefix`, ignoring case.
pub async fn search_ingredients<C: ConnectionTrait>(
    db: &C,
    prefix: &str,
) -> Result<Vec<ingredient::Model>, AppError> {
    let needle = prefix.to_lowercase();
    let all = list_ingredients(db).await?;
    Ok(all
        .into_iter()
        .filter(|i| i.name.to_lowercase().starts_with(&needle))
        .collect())
}

/// Loads every id in `ids`; the first missing id is reported as not found.
pub async fn require_ingredients<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> Result<Vec<ingredient::Model>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|i| i.id == **id)) {
        return Err(AppError::NotFound(format!("ingredient {missing} does not exist")));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{create_test_ingredient, setup_db};
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_search_is_case_insensitive_prefix() {
        let db = setup_db().await;
        create_test_ingredient(&db, "Sugar", "g").await;
        create_test_ingredient(&db, "salt", "g").await;
        create_test_ingredient(&db, "Brown sugar", "g").await;

        let names: Vec<String> = search_ingredients(&db, "s")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Sugar".to_string(), "salt".to_string()]);
    }

    #[tokio::test]
    async fn test_require_ingredients_reports_missing() {
        let db = setup_db().await;
        let flour = create_test_ingredient(&db, "flour", "g").await;

        assert_eq!(require_ingredients(&db, &[flour.id]).await.unwrap().len(), 1);
        let err = require_ingredients(&db, &[flour.id, 999]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.reason().contains("999"));
    }

    #[tokio::test]
    async fn test_blank_ingredient_rejected() {
        let db = setup_db().await;
        assert!(matches!(
            create_ingredient(&db, " ", "g").await,
            Err(AppError::Validation(_))
        ));
    }
}
