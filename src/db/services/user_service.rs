use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use tracing::info;

use crate::auth::{hash_password, validate_new_password, verify_password};
use crate::db::entities::{cart, user};
use crate::error::AppError;

// --- User Service Functions ---

/// Input for account creation. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

/// Creates a user together with its shopping cart in a single transaction.
pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model, AppError> {
    if new_user.username.trim().is_empty() || new_user.email.trim().is_empty() {
        return Err(AppError::Validation("username and email are required".to_string()));
    }

    let txn = db.begin().await?;

    let created = user::ActiveModel {
        username: Set(new_user.username),
        email: Set(new_user.email),
        password_hash: Set(new_user.password_hash),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        is_staff: Set(new_user.is_staff),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    cart::ActiveModel {
        user_id: Set(created.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(user_id = created.id, "Created user with shopping cart.");
    Ok(created)
}

pub async fn get_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find_by_id(user_id).one(db).await?)
}

/// Like [`get_user`], but a missing user is an error.
pub async fn require_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<user::Model, AppError> {
    get_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} does not exist")))
}

pub async fn find_user_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Deletes a user. Authored recipes, favorites, subscriptions on either side
/// and the cart go with it through the ON DELETE CASCADE foreign keys.
pub async fn delete_user(db: &DatabaseConnection, user_id: i32) -> Result<(), AppError> {
    let result = user::Entity::delete_by_id(user_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("user {user_id} does not exist")));
    }
    info!(user_id = user_id, "Deleted user.");
    Ok(())
}

/// Checks an email/password pair. Unknown email and wrong password are
/// reported identically.
pub async fn verify_credentials<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
) -> Result<user::Model, AppError> {
    let user = find_user_by_email(db, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i32,
    current_password: &str,
    new_password: &str,
    cost: u32,
) -> Result<(), AppError> {
    let user = require_user(db, user_id).await?;

    if !verify_password(current_password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    validate_new_password(new_password)?;
    if current_password == new_password {
        return Err(AppError::Validation(
            "new password must differ from the current one".to_string(),
        ));
    }

    let mut active = user.into_active_model();
    active.password_hash = Set(hash_password(new_password, cost)?);
    active.update(db).await?;

    info!(user_id = user_id, "Password changed.");
    Ok(())
}

pub async fn get_cart_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Option<cart::Model>, AppError> {
    Ok(cart::Entity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{create_test_user, setup_db};
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_create_user_creates_cart() {
        let db = setup_db().await;
        let user = create_test_user(&db, "alice").await;

        let cart = get_cart_for_user(&db, user.id).await.unwrap();
        assert_eq!(cart.map(|c| c.user_id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let db = setup_db().await;
        let alice = create_test_user(&db, "alice").await;

        let err = create_user(
            &db,
            NewUser {
                username: "alice2".to_string(),
                email: alice.email.clone(),
                password_hash: alice.password_hash.clone(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                is_staff: false,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // The failed transaction left no orphan cart behind.
        let carts = cart::Entity::find().all(&db).await.unwrap();
        assert_eq!(carts.len(), 1);
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let db = setup_db().await;
        let alice = create_test_user(&db, "alice").await;

        let found = verify_credentials(&db, "alice@example.com", "password123").await.unwrap();
        assert_eq!(found.id, alice.id);

        assert!(matches!(
            verify_credentials(&db, "alice@example.com", "wrong-password").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_credentials(&db, "nobody@example.com", "password123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let db = setup_db().await;
        let alice = create_test_user(&db, "alice").await;

        assert!(matches!(
            change_password(&db, alice.id, "not-current", "brand-new-pass", crate::auth::MIN_BCRYPT_COST).await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            change_password(&db, alice.id, "password123", "short", crate::auth::MIN_BCRYPT_COST).await,
            Err(AppError::Validation(_))
        ));

        change_password(&db, alice.id, "password123", "brand-new-pass", crate::auth::MIN_BCRYPT_COST)
            .await
            .unwrap();
        assert!(verify_credentials(&db, &alice.email, "brand-new-pass").await.is_ok());
        assert!(verify_credentials(&db, &alice.email, "password123").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let db = setup_db().await;
        let err = delete_user(&db, 42).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
