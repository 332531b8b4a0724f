//! SQL access for users and treasures.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::filters::TreasureFilters;
use crate::models::{DragonTreasure, NewUser, User, TREASURE_COLUMNS};
use crate::pagination::{offset, ITEMS_PER_PAGE};

fn treasure_select(columns: &str) -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(format!(
        "SELECT {} FROM dragon_treasures t JOIN users u ON u.id = t.owner_id",
        columns
    ))
}

/// Fetches one treasure with its owner.
pub async fn fetch_treasure(pool: &PgPool, id: i64) -> Result<Option<DragonTreasure>, sqlx::Error> {
    let mut qb = treasure_select(TREASURE_COLUMNS);
    qb.push(" WHERE t.id = ").push_bind(id);
    qb.build_query_as::<DragonTreasure>()
        .fetch_optional(pool)
        .await
}

/// Counts the treasures matching `filters`.
pub async fn count_treasures(pool: &PgPool, filters: &TreasureFilters) -> Result<i64, sqlx::Error> {
    let mut qb = treasure_select("COUNT(*)");
    filters.push_where(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Fetches one page of treasures matching `filters`, ordered by id.
pub async fn fetch_treasure_page(
    pool: &PgPool,
    filters: &TreasureFilters,
    page: i64,
) -> Result<Vec<DragonTreasure>, sqlx::Error> {
    let mut qb = treasure_select(TREASURE_COLUMNS);
    filters.push_where(&mut qb);
    qb.push(" ORDER BY t.id ASC LIMIT ")
        .push_bind(ITEMS_PER_PAGE)
        .push(" OFFSET ")
        .push_bind(offset(page));
    qb.build_query_as::<DragonTreasure>().fetch_all(pool).await
}

/// Fetches every treasure owned by one of `owner_ids`, ordered by id.
pub async fn fetch_treasures_by_owners(
    pool: &PgPool,
    owner_ids: &[i64],
) -> Result<Vec<DragonTreasure>, sqlx::Error> {
    let mut qb = treasure_select(TREASURE_COLUMNS);
    qb.push(" WHERE t.owner_id = ANY(")
        .push_bind(owner_ids.to_vec())
        .push(") ORDER BY t.id ASC");
    qb.build_query_as::<DragonTreasure>().fetch_all(pool).await
}

/// Inserts a new treasure and returns its id.
///
/// The caller must have validated the record; a missing owner, name or
/// description surfaces as a database error.
pub async fn insert_treasure(pool: &PgPool, treasure: &DragonTreasure) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO dragon_treasures
            (name, description, value, cool_factor, is_published, created_at, updated_at, owner_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(treasure.name())
    .bind(treasure.description())
    .bind(treasure.value())
    .bind(treasure.cool_factor())
    .bind(treasure.is_published())
    .bind(treasure.created_at())
    .bind(treasure.updated_at())
    .bind(treasure.owner().map(|o| o.id))
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Writes every mutable column of a persisted treasure.
pub async fn update_treasure(pool: &PgPool, treasure: &DragonTreasure) -> Result<(), sqlx::Error> {
    let id = treasure.id().ok_or(sqlx::Error::RowNotFound)?;
    let result = sqlx::query(
        r#"
        UPDATE dragon_treasures
        SET name = $2, description = $3, value = $4, cool_factor = $5,
            is_published = $6, created_at = $7, updated_at = $8, owner_id = $9
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(treasure.name())
    .bind(treasure.description())
    .bind(treasure.value())
    .bind(treasure.cool_factor())
    .bind(treasure.is_published())
    .bind(treasure.created_at())
    .bind(treasure.updated_at())
    .bind(treasure.owner().map(|o| o.id))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn fetch_user(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, email, username, password FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count_users(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

/// Fetches one page of users, ordered by id.
pub async fn fetch_user_page(pool: &PgPool, page: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, username, password FROM users ORDER BY id ASC LIMIT $1 OFFSET $2",
    )
    .bind(ITEMS_PER_PAGE)
    .bind(offset(page))
    .fetch_all(pool)
    .await
}

/// Fetches every user, ordered by id.
pub async fn fetch_all_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, email, username, password FROM users ORDER BY id ASC")
        .fetch_all(pool)
        .await
}

/// Inserts a user. The password must already be hashed.
pub async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, username, password)
        VALUES ($1, $2, $3)
        RETURNING id, email, username, password
        "#,
    )
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.password)
    .fetch_one(pool)
    .await
}
