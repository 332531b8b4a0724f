//! User endpoints, including the treasures-per-user sub-resource.

use std::collections::HashMap;

use axum::{
    extract::{Path, RawQuery, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use sqlx::PgPool;

use crate::error::AppError;
use crate::filters::{parse_properties, CollectionQuery};
use crate::models::{DragonTreasure, UserWithTreasures};
use crate::pagination::HydraCollection;
use crate::repository;
use crate::routes::treasures;
use crate::serializer::{normalize, Group, NormalizationContext};

const USER_READ_GROUPS: &[Group] = &[Group::UserRead];

/// Creates the users router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/users/{user_id}/treasures", get(list_user_treasures))
        .with_state(pool)
}

/// GET /api/users/{user_id}/treasures
///
/// Treasures owned by one user, with the same filters and pagination as
/// the main collection. An unknown user yields an empty collection.
async fn list_user_treasures(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
    RawQuery(raw): RawQuery,
) -> Result<Json<HydraCollection>, AppError> {
    let mut query = CollectionQuery::parse(raw.as_deref())?;
    query.filters.scope_owner = Some(user_id);
    let path = format!("/api/users/{}/treasures", user_id);
    treasures::list(&pool, query, &path).await.map(Json)
}

/// GET /api/users/{id}
async fn get_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, AppError> {
    let properties = parse_properties(raw.as_deref())?;
    let user = repository::fetch_user(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    let treasures = repository::fetch_treasures_by_owners(&pool, &[id]).await?;

    let resource = UserWithTreasures { user, treasures };
    let context = NormalizationContext::new(USER_READ_GROUPS).with_properties(properties);
    Ok(Json(normalize(&resource, &context)))
}

/// GET /api/users
///
/// Accepts `page` and `properties[]` only; users have no filters.
async fn list_users(
    State(pool): State<PgPool>,
    RawQuery(raw): RawQuery,
) -> Result<Json<HydraCollection>, AppError> {
    let query = CollectionQuery::parse_unfiltered(raw.as_deref())?;

    let total = repository::count_users(&pool).await?;
    let users = repository::fetch_user_page(&pool, query.page).await?;
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    let treasures = repository::fetch_treasures_by_owners(&pool, &ids).await?;

    let context = NormalizationContext::new(USER_READ_GROUPS).with_properties(query.properties);
    let member = group_by_owner(users, treasures)
        .iter()
        .map(|resource| normalize(resource, &context))
        .collect();

    Ok(Json(HydraCollection::new(
        member,
        total,
        "/api/users",
        &query.passthrough,
        query.page,
    )))
}

/// Attaches each treasure to its owner, keeping the users' order.
fn group_by_owner(
    users: Vec<crate::models::User>,
    treasures: Vec<DragonTreasure>,
) -> Vec<UserWithTreasures> {
    let mut by_owner: HashMap<i64, Vec<DragonTreasure>> = HashMap::new();
    for treasure in treasures {
        if let Some(owner_id) = treasure.owner().map(|o| o.id) {
            by_owner.entry(owner_id).or_default().push(treasure);
        }
    }
    users
        .into_iter()
        .map(|user| {
            let treasures = by_owner.remove(&user.id).unwrap_or_default();
            UserWithTreasures { user, treasures }
        })
        .collect()
}
