//! Treasure resource endpoints.

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde_json::Value;
use sqlx::PgPool;

use crate::error::AppError;
use crate::filters::{parse_properties, CollectionQuery};
use crate::models::DragonTreasure;
use crate::pagination::HydraCollection;
use crate::repository;
use crate::serializer::{normalize, Group, NormalizationContext, OwnerRef, TreasureInput};
use crate::validation::validate_treasure;

/// Groups used when reading a single treasure.
const ITEM_GET_GROUPS: &[Group] = &[Group::TreasureRead, Group::TreasureItemGet];
/// Groups used when reading treasures elsewhere.
const READ_GROUPS: &[Group] = &[Group::TreasureRead];
/// Groups accepted when writing a treasure.
const WRITE_GROUPS: &[Group] = &[Group::TreasureWrite];

/// Creates the treasures router. There is no DELETE route.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/treasures", get(list_treasures).post(create_treasure))
        .route("/treasures/{id}", patch(update_treasure))
        .route("/treasures/{id}/info", get(get_treasure_info))
        .with_state(pool)
}

/// GET /api/treasures/{id}/info
///
/// Honors `properties[]` projection like the collections do.
async fn get_treasure_info(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, AppError> {
    let properties = parse_properties(raw.as_deref())?;
    let treasure = find_treasure(&pool, id).await?;
    let context = NormalizationContext::new(ITEM_GET_GROUPS).with_properties(properties);
    Ok(Json(normalize(&treasure, &context)))
}

/// GET /api/treasures
async fn list_treasures(
    State(pool): State<PgPool>,
    RawQuery(raw): RawQuery,
) -> Result<Json<HydraCollection>, AppError> {
    let query = CollectionQuery::parse(raw.as_deref())?;
    list(&pool, query, "/api/treasures").await.map(Json)
}

/// POST /api/treasures
async fn create_treasure(
    State(pool): State<PgPool>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let input = TreasureInput::from_json(&body, WRITE_GROUPS)?;

    let mut treasure = DragonTreasure::new();
    input.apply(&mut treasure);
    resolve_owner(&pool, &input, &mut treasure).await?;
    validate_treasure(&treasure)?;

    let id = repository::insert_treasure(&pool, &treasure).await?;
    let created = find_treasure(&pool, id).await?;

    tracing::info!(
        treasure_id = id,
        owner_id = ?created.owner().map(|o| o.id),
        "Treasure created"
    );

    Ok((
        StatusCode::CREATED,
        Json(normalize(&created, &NormalizationContext::new(READ_GROUPS))),
    ))
}

/// PATCH /api/treasures/{id}
async fn update_treasure(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let input = TreasureInput::from_json(&body, WRITE_GROUPS)?;

    let mut treasure = find_treasure(&pool, id).await?;
    input.apply(&mut treasure);
    resolve_owner(&pool, &input, &mut treasure).await?;
    validate_treasure(&treasure)?;

    treasure.touch();
    repository::update_treasure(&pool, &treasure).await?;
    let updated = find_treasure(&pool, id).await?;

    tracing::info!(treasure_id = id, "Treasure updated");

    Ok(Json(normalize(
        &updated,
        &NormalizationContext::new(READ_GROUPS),
    )))
}

/// Runs a filtered, paginated treasure listing and wraps it in a collection.
pub(crate) async fn list(
    pool: &PgPool,
    query: CollectionQuery,
    path: &str,
) -> Result<HydraCollection, AppError> {
    let total = repository::count_treasures(pool, &query.filters).await?;
    let treasures = repository::fetch_treasure_page(pool, &query.filters, query.page).await?;

    let context = NormalizationContext::new(READ_GROUPS).with_properties(query.properties.clone());
    let member = treasures.iter().map(|t| normalize(t, &context)).collect();

    Ok(HydraCollection::new(
        member,
        total,
        path,
        &query.passthrough,
        query.page,
    ))
}

async fn find_treasure(pool: &PgPool, id: i64) -> Result<DragonTreasure, AppError> {
    repository::fetch_treasure(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Treasure {} not found", id)))
}

/// Loads the owner referenced by the request body, if any.
async fn resolve_owner(
    pool: &PgPool,
    input: &TreasureInput,
    treasure: &mut DragonTreasure,
) -> Result<(), AppError> {
    match input.owner {
        None => {}
        Some(OwnerRef::Null) => {
            treasure.set_owner(None);
        }
        Some(OwnerRef::Id(user_id)) => {
            let owner = repository::fetch_user(pool, user_id).await?.ok_or_else(|| {
                AppError::BadRequest(format!("Item not found for \"/api/users/{}\".", user_id))
            })?;
            treasure.set_owner(Some(owner));
        }
    }
    Ok(())
}
