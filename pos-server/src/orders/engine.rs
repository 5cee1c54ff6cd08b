//! Order State Engine
//!
//! 订单生命周期的唯一入口。一条 line_item 从加入购物车到完成结账的每次
//! 状态变化都经过这里，按 [`FlowVariant`] 的转移表执行。
//!
//! Write rules:
//! - Merge is a single `UPDATE … WHERE id = (SELECT …)` so two concurrent
//!   adds for the same (table, server, item) both land. The statement is the
//!   first write of its transaction, which also makes the open-order lookup
//!   that follows read post-commit state under WAL.
//! - Bulk transitions capture and move their row set in one
//!   `UPDATE … RETURNING`, never a read-then-write pair.
//! - A guarded transition that matches no row reports not-found or
//!   stage-conflict distinctly. No silent no-ops.

use shared::flow::restaurant;
use shared::models::{
    AddItemInput, AddItemOutcome, BulkTransition, CartLine, CustomerInfoInput, KitchenLine,
    LineItem, OrderSummary, SummaryLine,
};
use shared::{FlowVariant, util};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::repository::{self, RepoError};
use crate::orders::filter::{LineFilter, Scope, bind_query_as};

/// Engine error types, mapped to HTTP codes at the API edge
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Line {line_id} is in stage '{found}', expected '{expected}'")]
    StageConflict {
        line_id: i64,
        expected: String,
        found: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Database(err.to_string())
    }
}

impl From<RepoError> for EngineError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(m) => EngineError::NotFound(m),
            RepoError::Validation(m) | RepoError::Duplicate(m) => EngineError::Validation(m),
            RepoError::Database(m) => EngineError::Database(m),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

const LINE_COLUMNS: &str =
    "id, order_id, item_ref, quantity, table_ref, server_ref, chef_ref, status, created_at, updated_at";

const CART_LINE_SELECT: &str = "SELECT l.id, l.order_id, l.item_ref, m.name AS item_name, m.price_cents AS price_cents, l.quantity, l.table_ref, l.server_ref, l.chef_ref, l.status, l.created_at, l.updated_at FROM line_item l JOIN menu_item m ON l.item_ref = m.id";

/// Pool-injected transactional core. Cheap to clone, shared via ServerState.
#[derive(Clone)]
pub struct OrderEngine {
    pool: SqlitePool,
    variant: FlowVariant,
}

impl OrderEngine {
    pub fn new(pool: SqlitePool, variant: FlowVariant) -> Self {
        Self { pool, variant }
    }

    pub fn variant(&self) -> FlowVariant {
        self.variant
    }

    fn kitchen_guard(&self) -> EngineResult<()> {
        if self.variant.has_kitchen() {
            Ok(())
        } else {
            Err(EngineError::Validation(
                "Kitchen operations are not available in the billing flow".into(),
            ))
        }
    }

    // ========== Writes ==========

    /// Add an item for (table, server). Merges into the newest open
    /// initial-stage line for the same item, else inserts a new line into the
    /// open order for the session (minting an order id if none is open).
    pub async fn add_item(
        &self,
        input: &AddItemInput,
        server_ref: i64,
    ) -> EngineResult<AddItemOutcome> {
        if input.quantity < 1 {
            return Err(EngineError::Validation(
                "Quantity must be at least 1".into(),
            ));
        }

        let item = repository::menu::find_by_id(&self.pool, input.item_ref)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("Menu item {} not found", input.item_ref))
            })?;
        if !item.is_active {
            return Err(EngineError::Validation(format!(
                "Menu item '{}' is inactive",
                item.name
            )));
        }

        let now = util::now_millis();
        let initial = self.variant.initial();
        let mut tx = self.pool.begin().await?;

        // Atomic merge. This UPDATE is the transaction's first statement, so
        // the connection takes the writer lock before reading anything.
        let merged: Option<(i64, i64, i64)> = sqlx::query_as(
            "UPDATE line_item SET quantity = quantity + ?1, updated_at = ?2 WHERE id = (SELECT id FROM line_item WHERE table_ref = ?3 AND server_ref = ?4 AND item_ref = ?5 AND status = ?6 ORDER BY created_at DESC, id DESC LIMIT 1) RETURNING id, order_id, quantity",
        )
        .bind(input.quantity)
        .bind(now)
        .bind(&input.table_ref)
        .bind(server_ref)
        .bind(input.item_ref)
        .bind(initial)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((line_id, order_id, quantity)) = merged {
            tx.commit().await?;
            return Ok(AddItemOutcome {
                line_id,
                order_id,
                quantity,
                merged: true,
            });
        }

        // No open line for the item: reuse the session's open order if any
        // line of it is still below the billed boundary.
        let open_order: Option<i64> = sqlx::query_scalar(
            "SELECT order_id FROM line_item WHERE table_ref = ?1 AND server_ref = ?2 AND status < ?3 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(&input.table_ref)
        .bind(server_ref)
        .bind(self.variant.billed())
        .fetch_optional(&mut *tx)
        .await?;

        let order_id = open_order.unwrap_or_else(util::snowflake_id);
        let line_id = util::snowflake_id();
        sqlx::query(
            "INSERT INTO line_item (id, order_id, item_ref, quantity, table_ref, server_ref, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        )
        .bind(line_id)
        .bind(order_id)
        .bind(input.item_ref)
        .bind(input.quantity)
        .bind(&input.table_ref)
        .bind(server_ref)
        .bind(initial)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AddItemOutcome {
            line_id,
            order_id,
            quantity: input.quantity,
            merged: false,
        })
    }

    /// Replace a line's quantity. `quantity <= 0` deletes the line and
    /// returns `None`. `created_at` is never touched.
    pub async fn update_quantity(
        &self,
        line_id: i64,
        quantity: i64,
    ) -> EngineResult<Option<LineItem>> {
        if quantity <= 0 {
            self.remove_line(line_id).await?;
            return Ok(None);
        }

        let sql = format!(
            "UPDATE line_item SET quantity = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {LINE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, LineItem>(&sql)
            .bind(quantity)
            .bind(util::now_millis())
            .bind(line_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Line {line_id} not found")))?;
        Ok(Some(row))
    }

    pub async fn remove_line(&self, line_id: i64) -> EngineResult<()> {
        let rows = sqlx::query("DELETE FROM line_item WHERE id = ?")
            .bind(line_id)
            .execute(&self.pool)
            .await?;
        if rows.rows_affected() == 0 {
            return Err(EngineError::NotFound(format!("Line {line_id} not found")));
        }
        Ok(())
    }

    /// Bulk move every initial-stage line of (table, server) into the kitchen
    pub async fn send_to_kitchen(&self, table: &str, server_ref: i64) -> EngineResult<BulkTransition> {
        self.kitchen_guard()?;
        let rows: Vec<i64> = sqlx::query_scalar(
            "UPDATE line_item SET status = ?1, updated_at = ?2 WHERE table_ref = ?3 AND server_ref = ?4 AND status = ?5 RETURNING order_id",
        )
        .bind(restaurant::KITCHEN)
        .bind(util::now_millis())
        .bind(table)
        .bind(server_ref)
        .bind(restaurant::CART)
        .fetch_all(&self.pool)
        .await?;
        Ok(bulk_outcome(rows))
    }

    /// Move a chosen set of cart lines into the kitchen. Lines not in the
    /// cart stage are left alone and simply not counted.
    pub async fn send_selected(&self, line_ids: &[i64]) -> EngineResult<BulkTransition> {
        self.kitchen_guard()?;
        if line_ids.is_empty() {
            return Err(EngineError::Validation("No lines selected".into()));
        }
        let marks = vec!["?"; line_ids.len()].join(", ");
        let sql = format!(
            "UPDATE line_item SET status = ?, updated_at = ? WHERE id IN ({marks}) AND status = ? RETURNING order_id"
        );
        let mut q = sqlx::query_scalar::<_, i64>(&sql)
            .bind(restaurant::KITCHEN)
            .bind(util::now_millis());
        for id in line_ids {
            q = q.bind(*id);
        }
        let rows: Vec<i64> = q.bind(restaurant::CART).fetch_all(&self.pool).await?;
        Ok(bulk_outcome(rows))
    }

    /// Chef claims a kitchen line: kitchen → preparing with `chef_ref`
    /// assigned in the same statement.
    pub async fn claim_line(&self, line_id: i64, chef_ref: i64) -> EngineResult<LineItem> {
        self.kitchen_guard()?;
        self.guarded_single(
            line_id,
            &[restaurant::KITCHEN],
            restaurant::PREPARING,
            Some(chef_ref),
        )
        .await
    }

    /// Single-line transition to `to`, guarded by the variant's transition
    /// table. `chef_ref` is only applied when the move enters `preparing`.
    pub async fn update_stage(
        &self,
        line_id: i64,
        to: i64,
        chef_ref: Option<i64>,
    ) -> EngineResult<LineItem> {
        if !self.variant.is_valid_stage(to) {
            return Err(EngineError::Validation(format!(
                "Stage {to} is not valid for the {} flow",
                self.variant
            )));
        }
        let sources = self.variant.sources_for(to);
        if sources.is_empty() {
            return Err(EngineError::Validation(format!(
                "No transition leads to stage '{}'",
                self.variant.stage_name(to).unwrap_or("?")
            )));
        }
        let chef = if self.variant.has_kitchen() && to == restaurant::PREPARING {
            chef_ref
        } else {
            None
        };
        self.guarded_single(line_id, &sources, to, chef).await
    }

    /// kitchen / preparing / ready → served
    pub async fn mark_served(&self, line_id: i64) -> EngineResult<LineItem> {
        self.kitchen_guard()?;
        let sources = self.variant.sources_for(restaurant::SERVED);
        self.guarded_single(line_id, &sources, restaurant::SERVED, None)
            .await
    }

    /// Bulk move (table, server) lines from the bill source stage to billed.
    /// Restaurant: served → billed; billing flow: pending → checked_out.
    /// Optional customer info is attached to every affected order in the same
    /// transaction.
    pub async fn send_to_bill(
        &self,
        table: &str,
        server_ref: i64,
        customer: Option<&CustomerInfoInput>,
    ) -> EngineResult<BulkTransition> {
        let now = util::now_millis();
        let mut tx = self.pool.begin().await?;

        let rows: Vec<i64> = sqlx::query_scalar(
            "UPDATE line_item SET status = ?1, updated_at = ?2 WHERE table_ref = ?3 AND server_ref = ?4 AND status = ?5 RETURNING order_id",
        )
        .bind(self.variant.billed())
        .bind(now)
        .bind(table)
        .bind(server_ref)
        .bind(self.variant.bill_source())
        .fetch_all(&mut *tx)
        .await?;

        let outcome = bulk_outcome(rows);
        if outcome.moved > 0 {
            if let Some(c) = customer {
                for order_id in &outcome.order_ids {
                    sqlx::query(
                        "INSERT INTO customer_info (id, order_id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .bind(util::snowflake_id())
                    .bind(order_id)
                    .bind(&c.name)
                    .bind(&c.phone)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    /// Bulk move every billed line of one order to completed
    pub async fn complete_order(&self, order_id: i64) -> EngineResult<BulkTransition> {
        let rows: Vec<i64> = sqlx::query_scalar(
            "UPDATE line_item SET status = ?1, updated_at = ?2 WHERE order_id = ?3 AND status = ?4 RETURNING order_id",
        )
        .bind(self.variant.completed())
        .bind(util::now_millis())
        .bind(order_id)
        .bind(self.variant.billed())
        .fetch_all(&self.pool)
        .await?;
        Ok(bulk_outcome(rows))
    }

    /// Guarded single-line transition. Zero matched rows is diagnosed into
    /// not-found vs stage-conflict rather than swallowed.
    async fn guarded_single(
        &self,
        line_id: i64,
        sources: &[i64],
        to: i64,
        chef_ref: Option<i64>,
    ) -> EngineResult<LineItem> {
        let marks = vec!["?"; sources.len()].join(", ");
        let sql = if chef_ref.is_some() {
            format!(
                "UPDATE line_item SET status = ?, chef_ref = ?, updated_at = ? WHERE id = ? AND status IN ({marks}) RETURNING {LINE_COLUMNS}"
            )
        } else {
            format!(
                "UPDATE line_item SET status = ?, updated_at = ? WHERE id = ? AND status IN ({marks}) RETURNING {LINE_COLUMNS}"
            )
        };

        let mut q = sqlx::query_as::<_, LineItem>(&sql).bind(to);
        if let Some(chef) = chef_ref {
            q = q.bind(chef);
        }
        q = q.bind(util::now_millis()).bind(line_id);
        for s in sources {
            q = q.bind(*s);
        }

        if let Some(row) = q.fetch_optional(&self.pool).await? {
            return Ok(row);
        }

        // Diagnose: missing row vs wrong stage
        match self.find_line(line_id).await? {
            None => Err(EngineError::NotFound(format!("Line {line_id} not found"))),
            Some(line) => {
                let expected = sources
                    .iter()
                    .map(|s| self.variant.stage_name(*s).unwrap_or("?"))
                    .collect::<Vec<_>>()
                    .join("/");
                Err(EngineError::StageConflict {
                    line_id,
                    expected,
                    found: self
                        .variant
                        .stage_name(line.status)
                        .unwrap_or("unknown")
                        .to_string(),
                })
            }
        }
    }

    // ========== Reads ==========

    pub async fn find_line(&self, line_id: i64) -> EngineResult<Option<LineItem>> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM line_item WHERE id = ?");
        let row = sqlx::query_as::<_, LineItem>(&sql)
            .bind(line_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Lines joined with menu data, newest first — the way the order screen
    /// lists the session
    pub async fn lines(&self, filter: &LineFilter) -> EngineResult<Vec<CartLine>> {
        let sql = format!(
            "{CART_LINE_SELECT}{} ORDER BY l.created_at DESC, l.id DESC",
            filter.where_clause()
        );
        let rows = bind_query_as(sqlx::query_as::<_, CartLine>(&sql), filter.binds())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Newest initial-stage line per item for (table, server) — what the
    /// order screen shows next to each menu entry.
    pub async fn menu_view(&self, table: &str, server_ref: i64) -> EngineResult<Vec<CartLine>> {
        let sql = "SELECT id, order_id, item_ref, item_name, price_cents, quantity, table_ref, server_ref, chef_ref, status, created_at, updated_at FROM (SELECT l.id, l.order_id, l.item_ref, m.name AS item_name, m.price_cents AS price_cents, l.quantity, l.table_ref, l.server_ref, l.chef_ref, l.status, l.created_at, l.updated_at, ROW_NUMBER() OVER (PARTITION BY l.item_ref ORDER BY l.created_at DESC, l.id DESC) AS rn FROM line_item l JOIN menu_item m ON l.item_ref = m.id WHERE l.table_ref = ?1 AND l.server_ref = ?2 AND l.status = ?3) WHERE rn = 1 ORDER BY created_at DESC";
        let rows = sqlx::query_as::<_, CartLine>(sql)
            .bind(table)
            .bind(server_ref)
            .bind(self.variant.initial())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Kitchen display: in-flight lines with item and server names, oldest
    /// first so the queue reads top-down.
    pub async fn kitchen_display(&self, scope: Scope) -> EngineResult<Vec<KitchenLine>> {
        self.kitchen_guard()?;
        let filter = LineFilter::new()
            .status_in(self.variant.kitchen_stages())
            .scope(scope);
        let sql = format!(
            "SELECT l.id, l.order_id, m.name AS item_name, l.quantity, l.table_ref, u.display_name AS server_name, l.chef_ref, l.status, l.created_at FROM line_item l JOIN menu_item m ON l.item_ref = m.id JOIN users u ON l.server_ref = u.id{} ORDER BY l.created_at ASC, l.id ASC",
            filter.where_clause()
        );
        let rows = bind_query_as(sqlx::query_as::<_, KitchenLine>(&sql), filter.binds())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Orders awaiting completion, grouped for the biller screen
    pub async fn billed_orders(&self, scope: Scope) -> EngineResult<Vec<OrderSummary>> {
        let filter = LineFilter::new().status(self.variant.billed()).scope(scope);
        self.grouped_orders(&filter).await
    }

    /// Completed orders with `created_at` in [from, to), grouped
    pub async fn completed_orders(
        &self,
        from_millis: i64,
        to_millis: i64,
        scope: Scope,
    ) -> EngineResult<Vec<OrderSummary>> {
        let filter = LineFilter::new()
            .status(self.variant.completed())
            .created_from(from_millis)
            .created_before(to_millis)
            .scope(scope);
        self.grouped_orders(&filter).await
    }

    /// One order grouped across all stages, for the receipt view
    pub async fn order_summary(&self, order_id: i64) -> EngineResult<OrderSummary> {
        let filter = LineFilter::new().order_id(order_id);
        self.grouped_orders(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound(format!("Order {order_id} not found")))
    }

    /// Group lines into per-order summaries. Split lines of one item are
    /// collapsed with quantities summed. Newest orders first (snowflake
    /// order ids sort by creation time).
    async fn grouped_orders(&self, filter: &LineFilter) -> EngineResult<Vec<OrderSummary>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            order_id: i64,
            table_ref: String,
            server_ref: i64,
            server_name: Option<String>,
            item_ref: i64,
            item_name: String,
            price_cents: i64,
            quantity: i64,
            created_at: i64,
            customer_name: Option<String>,
            customer_phone: Option<String>,
        }

        let sql = format!(
            "SELECT l.order_id, l.table_ref, l.server_ref, u.display_name AS server_name, l.item_ref, m.name AS item_name, m.price_cents AS price_cents, SUM(l.quantity) AS quantity, MIN(l.created_at) AS created_at, ci.name AS customer_name, ci.phone AS customer_phone FROM line_item l JOIN menu_item m ON l.item_ref = m.id LEFT JOIN users u ON l.server_ref = u.id LEFT JOIN customer_info ci ON ci.id = (SELECT id FROM customer_info WHERE order_id = l.order_id ORDER BY created_at DESC, id DESC LIMIT 1){} GROUP BY l.order_id, l.table_ref, l.server_ref, u.display_name, l.item_ref, m.name, m.price_cents, ci.name, ci.phone ORDER BY l.order_id DESC, m.name ASC",
            filter.where_clause()
        );
        let rows = bind_query_as(sqlx::query_as::<_, Row>(&sql), filter.binds())
            .fetch_all(&self.pool)
            .await?;

        let mut orders: Vec<OrderSummary> = Vec::new();
        for row in rows {
            let line_total = row.quantity * row.price_cents;
            match orders.last_mut() {
                Some(o) if o.order_id == row.order_id => {
                    o.total_cents += line_total;
                    o.created_at = o.created_at.min(row.created_at);
                    o.lines.push(SummaryLine {
                        item_ref: row.item_ref,
                        item_name: row.item_name,
                        price_cents: row.price_cents,
                        quantity: row.quantity,
                        total_cents: line_total,
                    });
                }
                _ => orders.push(OrderSummary {
                    order_id: row.order_id,
                    table_ref: row.table_ref,
                    server_ref: row.server_ref,
                    server_name: row.server_name,
                    total_cents: line_total,
                    created_at: row.created_at,
                    customer_name: row.customer_name,
                    customer_phone: row.customer_phone,
                    lines: vec![SummaryLine {
                        item_ref: row.item_ref,
                        item_name: row.item_name,
                        price_cents: row.price_cents,
                        quantity: row.quantity,
                        total_cents: line_total,
                    }],
                }),
            }
        }
        Ok(orders)
    }
}

fn bulk_outcome(order_ids: Vec<i64>) -> BulkTransition {
    let moved = order_ids.len() as u64;
    let mut ids = order_ids;
    ids.sort_unstable();
    ids.dedup();
    BulkTransition {
        moved,
        order_ids: ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::flow::billing;

    async fn engine(variant: FlowVariant) -> OrderEngine {
        let db = DbService::new_in_memory().await.unwrap();
        OrderEngine::new(db.pool, variant)
    }

    async fn seed_server(pool: &SqlitePool, role: &str) -> i64 {
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

    async fn seed_item(pool: &SqlitePool, name: &str, price_cents: i64) -> i64 {
        let id = util::snowflake_id();
        let now = util::now_millis();
        sqlx::query(
            "INSERT INTO menu_item (id, name, category, price_cents, is_active, created_at, updated_at) VALUES (?1, ?2, 'Mains', ?3, 1, ?4, ?4)",
        )
        .bind(id)
        .bind(name)
        .bind(price_cents)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    fn add_input(table: &str, item: i64, qty: i64) -> AddItemInput {
        AddItemInput {
            table_ref: table.to_string(),
            item_ref: item,
            quantity: qty,
            server_ref: None,
        }
    }

    #[tokio::test]
    async fn double_add_merges_into_one_line() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        let first = eng.add_item(&add_input("T1", item, 2), server).await.unwrap();
        assert!(!first.merged);
        let before = eng.find_line(first.line_id).await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let second = eng.add_item(&add_input("T1", item, 3), server).await.unwrap();
        assert!(second.merged);
        assert_eq!(second.line_id, first.line_id);
        assert_eq!(second.order_id, first.order_id);
        assert_eq!(second.quantity, 5);

        let after = eng.find_line(first.line_id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 5);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn two_items_share_one_order() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let dosa = seed_item(&eng.pool, "Dosa", 900).await;
        let chai = seed_item(&eng.pool, "Chai", 200).await;

        let a = eng.add_item(&add_input("T1", dosa, 1), server).await.unwrap();
        let b = eng.add_item(&add_input("T1", chai, 2), server).await.unwrap();
        assert_ne!(a.line_id, b.line_id);
        assert_eq!(a.order_id, b.order_id);
    }

    #[tokio::test]
    async fn sent_line_is_not_merged_but_order_is_reused() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        let first = eng.add_item(&add_input("T1", item, 1), server).await.unwrap();
        eng.send_to_kitchen("T1", server).await.unwrap();

        let second = eng.add_item(&add_input("T1", item, 1), server).await.unwrap();
        assert!(!second.merged);
        assert_ne!(second.line_id, first.line_id);
        // kitchen line is still below the billed boundary, so same order
        assert_eq!(second.order_id, first.order_id);
    }

    #[tokio::test]
    async fn different_servers_get_different_orders() {
        let eng = engine(FlowVariant::Restaurant).await;
        let s1 = seed_server(&eng.pool, "server").await;
        let s2 = seed_server(&eng.pool, "server").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        let a = eng.add_item(&add_input("T1", item, 1), s1).await.unwrap();
        let b = eng.add_item(&add_input("T1", item, 1), s2).await.unwrap();
        assert_ne!(a.order_id, b.order_id);
    }

    #[tokio::test]
    async fn quantity_zero_deletes_line() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        let added = eng.add_item(&add_input("T1", item, 2), server).await.unwrap();
        let gone = eng.update_quantity(added.line_id, 0).await.unwrap();
        assert!(gone.is_none());
        assert!(eng.find_line(added.line_id).await.unwrap().is_none());

        let open = eng
            .lines(&LineFilter::new().table_ref("T1").server_ref(server))
            .await
            .unwrap();
        assert!(open.is_empty());
    }

    #[tokio::test]
    async fn quantity_update_preserves_created_at() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        let added = eng.add_item(&add_input("T1", item, 2), server).await.unwrap();
        let before = eng.find_line(added.line_id).await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = eng.update_quantity(added.line_id, 7).await.unwrap().unwrap();
        assert_eq!(updated.quantity, 7);
        assert_eq!(updated.created_at, before.created_at);
        assert!(updated.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn update_missing_line_is_not_found() {
        let eng = engine(FlowVariant::Restaurant).await;
        let err = eng.update_quantity(123456, 3).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn mark_served_on_cart_line_conflicts_without_mutation() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        let added = eng.add_item(&add_input("T1", item, 1), server).await.unwrap();
        let before = eng.find_line(added.line_id).await.unwrap().unwrap();

        let err = eng.mark_served(added.line_id).await.unwrap_err();
        assert!(matches!(err, EngineError::StageConflict { .. }));

        let after = eng.find_line(added.line_id).await.unwrap().unwrap();
        assert_eq!(after.status, restaurant::CART);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn send_to_kitchen_moves_only_cart_lines() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let dosa = seed_item(&eng.pool, "Dosa", 900).await;
        let chai = seed_item(&eng.pool, "Chai", 200).await;

        eng.add_item(&add_input("T1", dosa, 1), server).await.unwrap();
        eng.add_item(&add_input("T1", chai, 1), server).await.unwrap();

        let moved = eng.send_to_kitchen("T1", server).await.unwrap();
        assert_eq!(moved.moved, 2);
        assert_eq!(moved.order_ids.len(), 1);

        // nothing left in cart stage: second send moves zero
        let again = eng.send_to_kitchen("T1", server).await.unwrap();
        assert_eq!(again.moved, 0);
        assert!(again.order_ids.is_empty());
    }

    #[tokio::test]
    async fn send_selected_skips_non_cart_lines() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let dosa = seed_item(&eng.pool, "Dosa", 900).await;
        let chai = seed_item(&eng.pool, "Chai", 200).await;

        let a = eng.add_item(&add_input("T1", dosa, 1), server).await.unwrap();
        let b = eng.add_item(&add_input("T1", chai, 1), server).await.unwrap();
        eng.send_selected(&[a.line_id]).await.unwrap();

        let second = eng.send_selected(&[a.line_id, b.line_id]).await.unwrap();
        assert_eq!(second.moved, 1);
    }

    #[tokio::test]
    async fn claim_assigns_chef_atomically() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let chef = seed_server(&eng.pool, "chef").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        let added = eng.add_item(&add_input("T1", item, 1), server).await.unwrap();
        eng.send_to_kitchen("T1", server).await.unwrap();

        let claimed = eng.claim_line(added.line_id, chef).await.unwrap();
        assert_eq!(claimed.status, restaurant::PREPARING);
        assert_eq!(claimed.chef_ref, Some(chef));

        // second claim hits the stage guard
        let err = eng.claim_line(added.line_id, chef).await.unwrap_err();
        assert!(matches!(err, EngineError::StageConflict { .. }));
    }

    #[tokio::test]
    async fn full_lifecycle_reaches_completed() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let chef = seed_server(&eng.pool, "chef").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        let added = eng.add_item(&add_input("T1", item, 2), server).await.unwrap();
        eng.send_to_kitchen("T1", server).await.unwrap();
        eng.claim_line(added.line_id, chef).await.unwrap();
        eng.update_stage(added.line_id, restaurant::READY, None)
            .await
            .unwrap();
        eng.mark_served(added.line_id).await.unwrap();

        let customer = CustomerInfoInput {
            name: "Asha".into(),
            phone: Some("9800000000".into()),
        };
        let billed = eng
            .send_to_bill("T1", server, Some(&customer))
            .await
            .unwrap();
        assert_eq!(billed.moved, 1);
        assert_eq!(billed.order_ids, vec![added.order_id]);

        let done = eng.complete_order(added.order_id).await.unwrap();
        assert_eq!(done.moved, 1);

        let line = eng.find_line(added.line_id).await.unwrap().unwrap();
        assert_eq!(line.status, restaurant::COMPLETED);

        let saved = repository::payment::customer_for_order(&eng.pool, added.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.name, "Asha");
    }

    #[tokio::test]
    async fn billed_orders_group_split_lines() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let item = seed_item(&eng.pool, "Dosa", 900).await;

        // two separate kitchen rounds of the same item -> two lines
        let first = eng.add_item(&add_input("T1", item, 1), server).await.unwrap();
        eng.send_to_kitchen("T1", server).await.unwrap();
        eng.add_item(&add_input("T1", item, 2), server).await.unwrap();
        eng.send_to_kitchen("T1", server).await.unwrap();

        eng.mark_served(first.line_id).await.unwrap();
        let lines = eng
            .lines(&LineFilter::new().order_id(first.order_id).status(restaurant::KITCHEN))
            .await
            .unwrap();
        for l in &lines {
            eng.mark_served(l.id).await.unwrap();
        }
        eng.send_to_bill("T1", server, None).await.unwrap();

        let orders = eng.billed_orders(Scope::All).await.unwrap();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.order_id, first.order_id);
        assert_eq!(order.lines.len(), 1, "split lines collapse per item");
        assert_eq!(order.lines[0].quantity, 3);
        assert_eq!(order.total_cents, 3 * 900);
    }

    #[tokio::test]
    async fn billing_flow_checkout_and_complete() {
        let eng = engine(FlowVariant::Billing).await;
        let teller = seed_server(&eng.pool, "biller").await;
        let item = seed_item(&eng.pool, "Soap", 4500).await;

        let added = eng.add_item(&add_input("C1", item, 2), teller).await.unwrap();

        let out = eng.send_to_bill("C1", teller, None).await.unwrap();
        assert_eq!(out.moved, 1);
        let line = eng.find_line(added.line_id).await.unwrap().unwrap();
        assert_eq!(line.status, billing::CHECKED_OUT);

        let done = eng.complete_order(added.order_id).await.unwrap();
        assert_eq!(done.moved, 1);
        let line = eng.find_line(added.line_id).await.unwrap().unwrap();
        assert_eq!(line.status, billing::COMPLETED);
    }

    #[tokio::test]
    async fn billing_flow_rejects_kitchen_ops() {
        let eng = engine(FlowVariant::Billing).await;
        let teller = seed_server(&eng.pool, "biller").await;
        let item = seed_item(&eng.pool, "Soap", 4500).await;
        eng.add_item(&add_input("C1", item, 1), teller).await.unwrap();

        let err = eng.send_to_kitchen("C1", teller).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        let err = eng.kitchen_display(Scope::All).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn add_unknown_item_is_not_found() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let err = eng
            .add_item(&add_input("T1", 999_999, 1), server)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn menu_view_returns_newest_line_per_item() {
        let eng = engine(FlowVariant::Restaurant).await;
        let server = seed_server(&eng.pool, "server").await;
        let dosa = seed_item(&eng.pool, "Dosa", 900).await;
        let chai = seed_item(&eng.pool, "Chai", 200).await;

        eng.add_item(&add_input("T1", dosa, 1), server).await.unwrap();
        eng.add_item(&add_input("T1", chai, 1), server).await.unwrap();
        eng.add_item(&add_input("T1", dosa, 2), server).await.unwrap(); // merges

        let view = eng.menu_view("T1", server).await.unwrap();
        assert_eq!(view.len(), 2);
        let dosa_line = view.iter().find(|l| l.item_ref == dosa).unwrap();
        assert_eq!(dosa_line.quantity, 3);
    }
}
