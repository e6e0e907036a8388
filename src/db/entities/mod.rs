//! SeaORM entities, one module per table.

pub mod cart;
pub mod cart_item;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod tag;
pub mod user;
pub mod user_favorite;
pub mod user_subscription;

pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::cart::Entity as Cart;
    pub use super::cart::Model as CartModel;
    pub use super::cart::ActiveModel as CartActiveModel;
    pub use super::cart::Column as CartColumn;

    pub use super::cart_item::Entity as CartItem;
    pub use super::cart_item::Model as CartItemModel;
    pub use super::cart_item::ActiveModel as CartItemActiveModel;
    pub use super::cart_item::Column as CartItemColumn;

    pub use super::recipe::Entity as Recipe;
    pub use super::recipe::Model as RecipeModel;
    pub use super::recipe::ActiveModel as RecipeActiveModel;
    pub use super::recipe::Column as RecipeColumn;

    pub use super::ingredient::Entity as Ingredient;
    pub use super::ingredient::Model as IngredientModel;
    pub use super::ingredient::ActiveModel as IngredientActiveModel;
    pub use super::ingredient::Column as IngredientColumn;

    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;
    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;

    pub use super::recipe_ingredient::Entity as RecipeIngredient;
    pub use super::recipe_ingredient::Model as RecipeIngredientModel;
    pub use super::recipe_ingredient::ActiveModel as RecipeIngredientActiveModel;
    pub use super::recipe_ingredient::Column as RecipeIngredientColumn;

    pub use super::recipe_tag::Entity as RecipeTag;
    pub use super::recipe_tag::Model as RecipeTagModel;
    pub use super::recipe_tag::ActiveModel as RecipeTagActiveModel;
    pub use super::recipe_tag::Column as RecipeTagColumn;

    pub use super::user_favorite::Entity as UserFavorite;
    pub use super::user_favorite::Model as UserFavoriteModel;
    pub use super::user_favorite::ActiveModel as UserFavoriteActiveModel;
    pub use super::user_favorite::Column as UserFavoriteColumn;

    pub use super::user_subscription::Entity as UserSubscription;
    pub use super::user_subscription::Model as UserSubscriptionModel;
    pub use super::user_subscription::ActiveModel as UserSubscriptionActiveModel;
    pub use super::user_subscription::Column as UserSubscriptionColumn;
}
