//! Menu Repository

use super::{RepoError, RepoResult};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};
use sqlx::SqlitePool;

const MENU_SELECT: &str =
    "SELECT id, name, category, price_cents, is_active, created_at, updated_at FROM menu_item";

pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<MenuItem>> {
    let sql = if include_inactive {
        format!("{MENU_SELECT} ORDER BY category, name")
    } else {
        format!("{MENU_SELECT} WHERE is_active = 1 ORDER BY category, name")
    };
    let rows = sqlx::query_as::<_, MenuItem>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let sql = format!("{MENU_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, MenuItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_active_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let sql = format!("{MENU_SELECT} WHERE id = ? AND is_active = 1");
    let row = sqlx::query_as::<_, MenuItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Distinct categories of active items, for the menu screen's filter bar
pub async fn categories(pool: &SqlitePool) -> RepoResult<Vec<String>> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM menu_item WHERE is_active = 1 ORDER BY category",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: MenuItemCreate) -> RepoResult<MenuItem> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO menu_item (id, name, category, price_cents, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.category)
    .bind(data.price_cents)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create menu item".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: MenuItemUpdate) -> RepoResult<MenuItem> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE menu_item SET name = COALESCE(?1, name), category = COALESCE(?2, category), price_cents = COALESCE(?3, price_cents), is_active = COALESCE(?4, is_active), updated_at = ?5 WHERE id = ?6",
    )
    .bind(&data.name)
    .bind(&data.category)
    .bind(data.price_cents)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Menu item {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Menu item {id} not found")))
}

/// Soft delete. Historical order lines keep referencing the row.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE menu_item SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
