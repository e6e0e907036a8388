pub mod entities;
pub mod services;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use tracing::info;

use crate::config::AppConfig;
use entities::prelude::*;

pub async fn connect(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.database_url.to_owned());
    opt.max_connections(config.max_connections)
        .sqlx_logging(false);

    Database::connect(opt).await
}

/// Creates every table that does not exist yet, parents before children so
/// foreign keys resolve on every backend.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Ingredient).await?;
    create_table(db, &schema, Tag).await?;
    create_table(db, &schema, Recipe).await?;
    create_table(db, &schema, Cart).await?;
    create_table(db, &schema, RecipeIngredient).await?;
    create_table(db, &schema, RecipeTag).await?;
    create_table(db, &schema, UserFavorite).await?;
    create_table(db, &schema, UserSubscription).await?;
    create_table(db, &schema, CartItem).await?;

    info!("Database schema is up to date.");
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}

#[cfg(test)]
pub mod test_support {
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};

    use super::create_schema;
    use crate::db::entities::{ingredient, tag, user};
    use crate::db::services::{self, NewUser};

    /// A fresh in-memory SQLite database with the full schema.
    ///
    /// The pool is pinned to one connection; every connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn setup_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        create_schema(&db).await.unwrap();
        db
    }

    pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> user::Model {
        services::create_user(
            db,
            NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: crate::auth::hash_password("password123", crate::auth::MIN_BCRYPT_COST)
                    .unwrap(),
                first_name: username.to_string(),
                last_name: "Tester".to_string(),
                is_staff: false,
            },
        )
        .await
        .unwrap()
    }

    pub async fn create_test_ingredient(
        db: &DatabaseConnection,
        name: &str,
        unit: &str,
    ) -> ingredient::Model {
        services::create_ingredient(db, name, unit).await.unwrap()
    }

    pub async fn create_test_tag(db: &DatabaseConnection, slug: &str) -> tag::Model {
        services::create_tag(db, slug, "#E26C2D", slug).await.unwrap()
    }
}
