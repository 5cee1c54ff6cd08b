//! Payment / Customer Repository

use super::{RepoError, RepoResult};
use shared::models::{CustomerInfo, CustomerInfoInput, PaymentRecord};
use sqlx::SqlitePool;

/// Tag an order with a payment mode. Append-only: tagging twice leaves two
/// rows and readers take the newest.
pub async fn record_mode(
    pool: &SqlitePool,
    order_id: i64,
    mode: &str,
    biller_ref: i64,
) -> RepoResult<PaymentRecord> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM line_item WHERE order_id = ?")
        .bind(order_id)
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(RepoError::NotFound(format!("Order {order_id} not found")));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO payment_record (id, order_id, mode, biller_ref, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(id)
    .bind(order_id)
    .bind(mode)
    .bind(biller_ref)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(PaymentRecord {
        id,
        order_id,
        mode: mode.to_string(),
        biller_ref,
        created_at: now,
    })
}

/// Newest payment tag for an order, if any
pub async fn latest_mode(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<PaymentRecord>> {
    let row = sqlx::query_as::<_, PaymentRecord>(
        "SELECT id, order_id, mode, biller_ref, created_at FROM payment_record WHERE order_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn save_customer_info(
    pool: &SqlitePool,
    order_id: i64,
    data: &CustomerInfoInput,
) -> RepoResult<CustomerInfo> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO customer_info (id, order_id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(id)
    .bind(order_id)
    .bind(&data.name)
    .bind(&data.phone)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(CustomerInfo {
        id,
        order_id,
        name: data.name.clone(),
        phone: data.phone.clone(),
        created_at: now,
    })
}

pub async fn customer_for_order(
    pool: &SqlitePool,
    order_id: i64,
) -> RepoResult<Option<CustomerInfo>> {
    let row = sqlx::query_as::<_, CustomerInfo>(
        "SELECT id, order_id, name, phone, created_at FROM customer_info WHERE order_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
