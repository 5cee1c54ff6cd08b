//! Analytics Repository
//!
//! Dashboard aggregation over `line_item`. Time range, stage and role scope
//! all arrive composed in a [`LineFilter`]; the SQL here only fixes the
//! grouping shape. Revenue joins the live menu price at read time.

use super::RepoResult;
use crate::orders::filter::{LineFilter, bind_query_as};
use serde::Serialize;
use sqlx::SqlitePool;

// ============================================================================
// Row Types
// ============================================================================

/// Headline figures. `items` counts lines, not quantities.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Overview {
    pub orders: i64,
    pub items: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItemSales {
    pub item_name: String,
    pub quantity: i64,
    pub line_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HourBucket {
    /// 0..=23, venue-local
    pub hour: i64,
    pub orders: i64,
    pub items: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TableStats {
    pub table_ref: String,
    pub orders: i64,
    pub items: i64,
    pub revenue_cents: i64,
    pub avg_line_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ServerStats {
    pub server_ref: i64,
    pub server_name: Option<String>,
    pub orders: i64,
    pub items: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ModeRevenue {
    pub mode: String,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StageCount {
    pub status: i64,
    pub orders: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategorySales {
    pub category: String,
    pub quantity: i64,
    pub orders: i64,
    pub revenue_cents: i64,
}

// ============================================================================
// Queries
// ============================================================================

pub async fn overview(pool: &SqlitePool, filter: &LineFilter) -> RepoResult<Overview> {
    let sql = format!(
        "SELECT COUNT(DISTINCT l.order_id) AS orders, COUNT(*) AS items, COALESCE(SUM(l.quantity * m.price_cents), 0) AS revenue_cents FROM line_item l JOIN menu_item m ON l.item_ref = m.id{}",
        filter.where_clause()
    );
    let row = bind_query_as(sqlx::query_as::<_, Overview>(&sql), filter.binds())
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn popular_items(
    pool: &SqlitePool,
    filter: &LineFilter,
    limit: i64,
) -> RepoResult<Vec<ItemSales>> {
    let sql = format!(
        "SELECT m.name AS item_name, SUM(l.quantity) AS quantity, COUNT(*) AS line_count, SUM(l.quantity * m.price_cents) AS revenue_cents FROM line_item l JOIN menu_item m ON l.item_ref = m.id{} GROUP BY l.item_ref, m.name ORDER BY quantity DESC LIMIT ?",
        filter.where_clause()
    );
    let rows = bind_query_as(sqlx::query_as::<_, ItemSales>(&sql), filter.binds())
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Orders bucketed by venue-local hour. `tz_offset_ms` shifts the stored
/// UTC millis before the hour is taken.
pub async fn hourly_orders(
    pool: &SqlitePool,
    filter: &LineFilter,
    tz_offset_ms: i64,
) -> RepoResult<Vec<HourBucket>> {
    let sql = format!(
        "SELECT CAST(STRFTIME('%H', (l.created_at + ?) / 1000, 'unixepoch') AS INTEGER) AS hour, COUNT(DISTINCT l.order_id) AS orders, COUNT(*) AS items, COALESCE(SUM(l.quantity * m.price_cents), 0) AS revenue_cents FROM line_item l JOIN menu_item m ON l.item_ref = m.id{} GROUP BY hour ORDER BY hour",
        filter.where_clause()
    );
    let rows = bind_query_as(
        sqlx::query_as::<_, HourBucket>(&sql).bind(tz_offset_ms),
        filter.binds(),
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn table_performance(
    pool: &SqlitePool,
    filter: &LineFilter,
) -> RepoResult<Vec<TableStats>> {
    let sql = format!(
        "SELECT l.table_ref AS table_ref, COUNT(DISTINCT l.order_id) AS orders, COUNT(*) AS items, COALESCE(SUM(l.quantity * m.price_cents), 0) AS revenue_cents, CAST(AVG(l.quantity * m.price_cents) AS INTEGER) AS avg_line_cents FROM line_item l JOIN menu_item m ON l.item_ref = m.id{} GROUP BY l.table_ref ORDER BY revenue_cents DESC",
        filter.where_clause()
    );
    let rows = bind_query_as(sqlx::query_as::<_, TableStats>(&sql), filter.binds())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn server_performance(
    pool: &SqlitePool,
    filter: &LineFilter,
) -> RepoResult<Vec<ServerStats>> {
    let sql = format!(
        "SELECT l.server_ref AS server_ref, u.display_name AS server_name, COUNT(DISTINCT l.order_id) AS orders, COUNT(*) AS items, COALESCE(SUM(l.quantity * m.price_cents), 0) AS revenue_cents FROM line_item l JOIN menu_item m ON l.item_ref = m.id LEFT JOIN users u ON l.server_ref = u.id{} GROUP BY l.server_ref, u.display_name ORDER BY revenue_cents DESC",
        filter.where_clause()
    );
    let rows = bind_query_as(sqlx::query_as::<_, ServerStats>(&sql), filter.binds())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Revenue per payment mode. An order tagged twice counts once, under its
/// newest tag (payment_record itself is append-only).
pub async fn payment_mode_revenue(
    pool: &SqlitePool,
    filter: &LineFilter,
) -> RepoResult<Vec<ModeRevenue>> {
    let sql = format!(
        "SELECT p.mode AS mode, COALESCE(SUM(l.quantity * m.price_cents), 0) AS revenue_cents FROM line_item l JOIN menu_item m ON l.item_ref = m.id JOIN payment_record p ON p.id = (SELECT id FROM payment_record WHERE order_id = l.order_id ORDER BY created_at DESC, id DESC LIMIT 1){} GROUP BY p.mode ORDER BY revenue_cents DESC",
        filter.where_clause()
    );
    let rows = bind_query_as(sqlx::query_as::<_, ModeRevenue>(&sql), filter.binds())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Distinct orders per stage code, for the live pipeline board
pub async fn stage_counts(pool: &SqlitePool, filter: &LineFilter) -> RepoResult<Vec<StageCount>> {
    let sql = format!(
        "SELECT l.status AS status, COUNT(DISTINCT l.order_id) AS orders FROM line_item l{} GROUP BY l.status ORDER BY l.status",
        filter.where_clause()
    );
    let rows = bind_query_as(sqlx::query_as::<_, StageCount>(&sql), filter.binds())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn category_sales(
    pool: &SqlitePool,
    filter: &LineFilter,
) -> RepoResult<Vec<CategorySales>> {
    let sql = format!(
        "SELECT m.category AS category, SUM(l.quantity) AS quantity, COUNT(DISTINCT l.order_id) AS orders, COALESCE(SUM(l.quantity * m.price_cents), 0) AS revenue_cents FROM line_item l JOIN menu_item m ON l.item_ref = m.id{} GROUP BY m.category ORDER BY quantity DESC",
        filter.where_clause()
    );
    let rows = bind_query_as(sqlx::query_as::<_, CategorySales>(&sql), filter.binds())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::flow::restaurant;
    use shared::util;

    async fn pool() -> SqlitePool {
        DbService::new_in_memory().await.unwrap().pool
    }

    async fn seed_user(pool: &SqlitePool, role: &str) -> i64 {
        let id = util::snowflake_id();
        let now = util::now_millis();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, display_name, role, is_active, created_at, updated_at) VALUES (?1, ?2, 'x', ?3, ?4, 1, ?5, ?5)",
        )
        .bind(id)
        .bind(format!("user-{id}"))
        .bind(format!("User {id}"))
        .bind(role)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn seed_item(pool: &SqlitePool, name: &str, category: &str, price_cents: i64) -> i64 {
        let id = util::snowflake_id();
        let now = util::now_millis();
        sqlx::query(
            "INSERT INTO menu_item (id, name, category, price_cents, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
        )
        .bind(id)
        .bind(name)
        .bind(category)
        .bind(price_cents)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    #[allow(clippy::too_many_arguments)]
    async fn seed_line(
        pool: &SqlitePool,
        order_id: i64,
        item_ref: i64,
        quantity: i64,
        table: &str,
        server_ref: i64,
        status: i64,
        created_at: i64,
    ) {
        sqlx::query(
            "INSERT INTO line_item (id, order_id, item_ref, quantity, table_ref, server_ref, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        )
        .bind(util::snowflake_id())
        .bind(order_id)
        .bind(item_ref)
        .bind(quantity)
        .bind(table)
        .bind(server_ref)
        .bind(status)
        .bind(created_at)
        .execute(pool)
        .await
        .unwrap();
    }

    const BASE: i64 = 1_700_000_000_000;

    #[tokio::test]
    async fn overview_revenue_matches_fixture() {
        let p = pool().await;
        let server = seed_user(&p, "server").await;
        let dosa = seed_item(&p, "Dosa", "Mains", 900).await;
        let chai = seed_item(&p, "Chai", "Drinks", 200).await;

        // in range, completed: 2*900 + 3*200 = 2400 over two orders
        seed_line(&p, 1, dosa, 2, "T1", server, restaurant::COMPLETED, BASE + 10).await;
        seed_line(&p, 2, chai, 3, "T2", server, restaurant::COMPLETED, BASE + 20).await;
        // before the range: excluded
        seed_line(&p, 3, dosa, 5, "T3", server, restaurant::COMPLETED, BASE - 1).await;
        // wrong stage: excluded
        seed_line(&p, 4, chai, 1, "T1", server, restaurant::SERVED, BASE + 30).await;

        let filter = LineFilter::new()
            .status(restaurant::COMPLETED)
            .created_from(BASE)
            .created_before(BASE + 1_000);
        let o = overview(&p, &filter).await.unwrap();
        assert_eq!(o.orders, 2);
        assert_eq!(o.items, 2);
        assert_eq!(o.revenue_cents, 2 * 900 + 3 * 200);
    }

    #[tokio::test]
    async fn revenue_follows_live_menu_price() {
        let p = pool().await;
        let server = seed_user(&p, "server").await;
        let dosa = seed_item(&p, "Dosa", "Mains", 900).await;
        seed_line(&p, 1, dosa, 2, "T1", server, restaurant::COMPLETED, BASE).await;

        let filter = LineFilter::new().status(restaurant::COMPLETED);
        assert_eq!(overview(&p, &filter).await.unwrap().revenue_cents, 1_800);

        // price is not snapshotted: a change moves past figures too
        sqlx::query("UPDATE menu_item SET price_cents = 1000 WHERE id = ?")
            .bind(dosa)
            .execute(&p)
            .await
            .unwrap();
        assert_eq!(overview(&p, &filter).await.unwrap().revenue_cents, 2_000);
    }

    #[tokio::test]
    async fn popular_items_rank_by_quantity_and_honor_limit() {
        let p = pool().await;
        let server = seed_user(&p, "server").await;
        let dosa = seed_item(&p, "Dosa", "Mains", 900).await;
        let chai = seed_item(&p, "Chai", "Drinks", 200).await;

        seed_line(&p, 1, dosa, 2, "T1", server, restaurant::COMPLETED, BASE).await;
        seed_line(&p, 2, dosa, 3, "T2", server, restaurant::COMPLETED, BASE + 1).await;
        seed_line(&p, 3, chai, 4, "T3", server, restaurant::COMPLETED, BASE + 2).await;

        let filter = LineFilter::new().status(restaurant::COMPLETED);
        let top = popular_items(&p, &filter, 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].item_name, "Dosa");
        assert_eq!(top[0].quantity, 5);
        assert_eq!(top[0].line_count, 2);
        assert_eq!(top[0].revenue_cents, 5 * 900);
    }

    #[tokio::test]
    async fn order_tagged_twice_counts_once_under_newest_mode() {
        let p = pool().await;
        let server = seed_user(&p, "server").await;
        let biller = seed_user(&p, "biller").await;
        let dosa = seed_item(&p, "Dosa", "Mains", 900).await;
        seed_line(&p, 1, dosa, 2, "T1", server, restaurant::COMPLETED, BASE).await;

        // cash tag first, card tag later
        for (mode, at) in [("cash", BASE + 10), ("card", BASE + 20)] {
            sqlx::query(
                "INSERT INTO payment_record (id, order_id, mode, biller_ref, created_at) VALUES (?1, 1, ?2, ?3, ?4)",
            )
            .bind(util::snowflake_id())
            .bind(mode)
            .bind(biller)
            .bind(at)
            .execute(&p)
            .await
            .unwrap();
        }

        let filter = LineFilter::new().status(restaurant::COMPLETED);
        let modes = payment_mode_revenue(&p, &filter).await.unwrap();
        assert_eq!(modes.len(), 1, "one row, not one per tag");
        assert_eq!(modes[0].mode, "card");
        assert_eq!(modes[0].revenue_cents, 1_800);
    }

    #[tokio::test]
    async fn hourly_buckets_shift_with_offset() {
        let p = pool().await;
        let server = seed_user(&p, "server").await;
        let dosa = seed_item(&p, "Dosa", "Mains", 900).await;

        // BASE = 2023-11-14 22:13:20 UTC
        seed_line(&p, 1, dosa, 1, "T1", server, restaurant::COMPLETED, BASE).await;
        seed_line(&p, 2, dosa, 1, "T2", server, restaurant::COMPLETED, BASE + 60_000).await;
        seed_line(&p, 3, dosa, 1, "T3", server, restaurant::COMPLETED, BASE + 3_600_000).await;

        let filter = LineFilter::new().status(restaurant::COMPLETED);
        let utc = hourly_orders(&p, &filter, 0).await.unwrap();
        assert_eq!(utc.len(), 2);
        assert_eq!((utc[0].hour, utc[0].orders), (22, 2));
        assert_eq!((utc[1].hour, utc[1].orders), (23, 1));

        // +1h offset moves every bucket forward (midnight sorts first)
        let shifted = hourly_orders(&p, &filter, 3_600_000).await.unwrap();
        assert_eq!((shifted[0].hour, shifted[0].orders), (0, 1));
        assert_eq!((shifted[1].hour, shifted[1].orders), (23, 2));
    }
}
