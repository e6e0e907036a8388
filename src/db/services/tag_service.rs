use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::entities::tag;
use crate::error::AppError;

// --- Tag Service Functions ---

/// Creates a tag. The colour is persisted as given; slugs are unique.
pub async fn create_tag<C: ConnectionTrait>(
    db: &C,
    name: &str,
    color: &str,
    slug: &str,
) -> Result<tag::Model, AppError> {
    if slug.is_empty()
        || !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(format!("invalid tag slug '{slug}'")));
    }

    Ok(tag::ActiveModel {
        name: Set(name.to_owned()),
        color: Set(color.to_owned()),
        slug: Set(slug.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn get_tag<C: ConnectionTrait>(db: &C, tag_id: i32) -> Result<Option<tag::Model>, AppError> {
    Ok(tag::Entity::find_by_id(tag_id).one(db).await?)
}

pub async fn list_tags<C: ConnectionTrait>(db: &C) -> Result<Vec<tag::Model>, AppError> {
    Ok(tag::Entity::find()
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await?)
}

pub async fn find_tags_by_slugs<C: ConnectionTrait>(
    db: &C,
    slugs: &[String],
) -> Result<Vec<tag::Model>, AppError> {
    if slugs.is_empty() {
        return Ok(Vec::new());
    }
    Ok(tag::Entity::find()
        .filter(tag::Column::Slug.is_in(slugs.to_vec()))
        .all(db)
        .await?)
}

/// Loads every id in `ids`; the first missing id is reported as not found.
pub async fn require_tags<C: ConnectionTrait>(db: &C, ids: &[i32]) -> Result<Vec<tag::Model>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found = tag::Entity::find()
        .filter(tag::Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|t| t.id == **id)) {
        return Err(AppError::NotFound(format!("tag {missing} does not exist")));
    }
    Ok(found)
}
