//! Membership engine: one guarded add/remove protocol for the three
//! user-owned relations (favorite recipe, subscription to an author, recipe
//! in the shopping cart).
//!
//! Every relation instance is either `Absent` or `Present`. Adding something
//! present, or removing something absent, is a validation error rather than
//! a silent no-op.

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::entities::{recipe, user};
use crate::db::services::{
    add_cart_item, add_favorite, add_subscription, get_cart_for_user, is_favorite, is_in_cart,
    is_subscribed, remove_cart_item, remove_favorite, remove_subscription, require_recipe,
    require_user,
};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Favorite,
    Subscription,
    Cart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    Absent,
    Present,
}

impl MembershipState {
    pub fn is_present(self) -> bool {
        self == MembershipState::Present
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Recipe,
    User,
}

/// What distinguishes one relation from another.
#[derive(Debug, Clone, Copy)]
pub struct RelationRules {
    /// Used in error reasons, e.g. "favorite already exists".
    pub label: &'static str,
    pub target: TargetKind,
    /// Requester and target may not be the same user.
    pub forbid_self: bool,
    /// Rows hang off the requester's cart rather than the requester.
    pub via_cart: bool,
}

impl RelationKind {
    pub fn rules(self) -> RelationRules {
        match self {
            RelationKind::Favorite => RelationRules {
                label: "favorite",
                target: TargetKind::Recipe,
                forbid_self: false,
                via_cart: false,
            },
            RelationKind::Subscription => RelationRules {
                label: "subscription",
                target: TargetKind::User,
                forbid_self: true,
                via_cart: false,
            },
            RelationKind::Cart => RelationRules {
                label: "shopping cart item",
                target: TargetKind::Recipe,
                forbid_self: false,
                via_cart: true,
            },
        }
    }
}

/// The entity on the far side of a relation, returned after an add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MembershipTarget {
    Recipe(recipe::Model),
    User(user::Model),
}

async fn load_target<C: ConnectionTrait>(
    db: &C,
    target: TargetKind,
    target_id: i32,
) -> Result<MembershipTarget, AppError> {
    Ok(match target {
        TargetKind::Recipe => MembershipTarget::Recipe(require_recipe(db, target_id).await?),
        TargetKind::User => MembershipTarget::User(require_user(db, target_id).await?),
    })
}

/// Resolves the id the relation rows are keyed by on the requester's side:
/// the user id itself, or the user's cart id. `None` means the user has no
/// cart.
async fn owner_id<C: ConnectionTrait>(
    db: &C,
    rules: RelationRules,
    requester_id: i32,
) -> Result<Option<i32>, AppError> {
    if rules.via_cart {
        Ok(get_cart_for_user(db, requester_id).await?.map(|c| c.id))
    } else {
        Ok(Some(requester_id))
    }
}

async fn read_state<C: ConnectionTrait>(
    db: &C,
    kind: RelationKind,
    owner_id: i32,
    target_id: i32,
) -> Result<MembershipState, AppError> {
    let present = match kind {
        RelationKind::Favorite => is_favorite(db, owner_id, target_id).await?,
        RelationKind::Subscription => is_subscribed(db, owner_id, target_id).await?,
        RelationKind::Cart => is_in_cart(db, owner_id, target_id).await?,
    };
    Ok(if present {
        MembershipState::Present
    } else {
        MembershipState::Absent
    })
}

async fn insert_row<C: ConnectionTrait>(
    db: &C,
    kind: RelationKind,
    owner_id: i32,
    target_id: i32,
    note: Option<String>,
) -> Result<(), AppError> {
    match kind {
        RelationKind::Favorite => add_favorite(db, owner_id, target_id, note).await.map(|_| ()),
        RelationKind::Subscription => add_subscription(db, owner_id, target_id).await.map(|_| ()),
        RelationKind::Cart => add_cart_item(db, owner_id, target_id).await.map(|_| ()),
    }
}

async fn delete_row<C: ConnectionTrait>(
    db: &C,
    kind: RelationKind,
    owner_id: i32,
    target_id: i32,
) -> Result<u64, AppError> {
    match kind {
        RelationKind::Favorite => remove_favorite(db, owner_id, target_id).await,
        RelationKind::Subscription => remove_subscription(db, owner_id, target_id).await,
        RelationKind::Cart => remove_cart_item(db, owner_id, target_id).await,
    }
}

/// Reads whether `requester_id` currently holds the relation to `target_id`.
///
/// A requester without a cart reads as `Absent` for [`RelationKind::Cart`].
pub async fn membership_state<C: ConnectionTrait>(
    db: &C,
    kind: RelationKind,
    requester_id: i32,
    target_id: i32,
) -> Result<MembershipState, AppError> {
    match owner_id(db, kind.rules(), requester_id).await? {
        Some(owner) => read_state(db, kind, owner, target_id).await,
        None => Ok(MembershipState::Absent),
    }
}

/// Moves the relation between `requester_id` and `target_id` to `intended`.
///
/// Returns the target entity after an add and `None` after a removal.
pub async fn toggle(
    db: &DatabaseConnection,
    kind: RelationKind,
    requester_id: i32,
    target_id: i32,
    intended: MembershipState,
) -> Result<Option<MembershipTarget>, AppError> {
    apply(db, kind, requester_id, target_id, intended, None).await
}

/// Adds a favorite carrying a free-form note.
pub async fn add_favorite_with_note(
    db: &DatabaseConnection,
    requester_id: i32,
    recipe_id: i32,
    note: Option<String>,
) -> Result<Option<MembershipTarget>, AppError> {
    apply(
        db,
        RelationKind::Favorite,
        requester_id,
        recipe_id,
        MembershipState::Present,
        note,
    )
    .await
}

async fn apply(
    db: &DatabaseConnection,
    kind: RelationKind,
    requester_id: i32,
    target_id: i32,
    intended: MembershipState,
    note: Option<String>,
) -> Result<Option<MembershipTarget>, AppError> {
    let rules = kind.rules();
    if rules.forbid_self && requester_id == target_id {
        return Err(AppError::Validation(format!(
            "{} to yourself is not allowed",
            rules.label
        )));
    }

    let txn = db.begin().await?;

    require_user(&txn, requester_id).await?;
    let target = load_target(&txn, rules.target, target_id).await?;
    let owner = owner_id(&txn, rules, requester_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no shopping cart".to_string()))?;

    let current = read_state(&txn, kind, owner, target_id).await?;
    match (current, intended) {
        (MembershipState::Present, MembershipState::Present) => {
            return Err(AppError::Validation(format!("{} already exists", rules.label)));
        }
        (MembershipState::Absent, MembershipState::Absent) => {
            return Err(AppError::Validation(format!("{} does not exist", rules.label)));
        }
        (MembershipState::Absent, MembershipState::Present) => {
            if let Err(err) = insert_row(&txn, kind, owner, target_id, note).await {
                if let AppError::Conflict(reason) = &err {
                    warn!(kind = ?kind, requester_id, target_id, reason = %reason, "Concurrent add collided.");
                }
                return Err(err);
            }
        }
        (MembershipState::Present, MembershipState::Absent) => {
            if delete_row(&txn, kind, owner, target_id).await? == 0 {
                return Err(AppError::Conflict(format!(
                    "{} was removed concurrently",
                    rules.label
                )));
            }
        }
    }

    txn.commit().await?;

    info!(kind = ?kind, requester_id, target_id, state = ?intended, "Membership changed.");
    Ok(match intended {
        MembershipState::Present => Some(target),
        MembershipState::Absent => None,
    })
}
