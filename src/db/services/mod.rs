//! The entity store: storage primitives over the sea-orm entities.
//!
//! Functions are generic over [`sea_orm::ConnectionTrait`] so callers can run
//! them against a pooled connection or inside an open transaction. All public
//! functions are re-exported here under `crate::db::services::`.

pub mod ingredient_service;
pub mod recipe_service;
pub mod relation_service;
pub mod tag_service;
pub mod user_service;

pub use ingredient_service::*;
pub use recipe_service::*;
pub use relation_service::*;
pub use tag_service::*;
pub use user_service::*;
