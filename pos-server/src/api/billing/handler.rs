//! Billing API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::models::line_item::{BulkTransition, OrderSummary};
use shared::models::payment::{CustomerInfoInput, PaymentModeInput, PaymentRecord};

use crate::api::scope::floor_scope;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::payment;
use crate::utils::time::{
    business_range_millis, current_business_date, parse_date, validate_not_future,
};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// 送结请求。`server_ref` 缺省为当前登录用户。
/// 客户信息可选，附到本次受影响的每个订单上。
#[derive(Debug, Deserialize, Validate)]
pub struct SendToBillRequest {
    #[validate(length(min = 1, message = "Table reference is required"))]
    pub table_ref: String,
    pub server_ref: Option<i64>,
    #[validate(nested)]
    pub customer: Option<CustomerInfoInput>,
}

/// 完成单列表查询参数。缺省 = 当前营业日。
#[derive(Debug, Deserialize)]
pub struct CompletedQuery {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

/// POST /api/billing/send - 整桌送结
///
/// restaurant: served → billed；billing: pending → checked_out。
pub async fn send_to_bill(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(input): Json<SendToBillRequest>,
) -> AppResult<Json<AppResponse<BulkTransition>>> {
    input.validate()?;
    let server_ref = input.server_ref.unwrap_or(user.id);
    let moved = state
        .engine
        .send_to_bill(&input.table_ref, server_ref, input.customer.as_ref())
        .await?;
    if moved.moved == 0 {
        return Err(AppError::not_found(format!(
            "No lines awaiting billing for table {}",
            input.table_ref
        )));
    }
    Ok(ok_with_message(moved, "Order sent to billing"))
}

/// GET /api/billing/billed - 收银屏待完成订单
pub async fn billed(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<OrderSummary>>>> {
    let scope = floor_scope(&state, &user).await?;
    let orders = state.engine.billed_orders(scope).await?;
    Ok(ok(orders))
}

/// GET /api/billing/order/{order_id} - 单个订单汇总 (小票视图)
pub async fn order_summary(
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
) -> AppResult<Json<AppResponse<OrderSummary>>> {
    let order = state.engine.order_summary(order_id).await?;
    Ok(ok(order))
}

/// POST /api/billing/payment-mode - 记录支付方式
///
/// 追加写入；同一订单重复记录时读取方取最新一条。
pub async fn payment_mode(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(input): Json<PaymentModeInput>,
) -> AppResult<Json<AppResponse<PaymentRecord>>> {
    input.validate()?;
    let record = payment::record_mode(state.pool(), input.order_id, &input.mode, user.id).await?;
    Ok(ok_with_message(record, "Payment mode recorded"))
}

/// POST /api/billing/complete/{order_id} - 完成订单 (billed → completed)
pub async fn complete(
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
) -> AppResult<Json<AppResponse<BulkTransition>>> {
    let moved = state.engine.complete_order(order_id).await?;
    if moved.moved == 0 {
        return Err(AppError::not_found(format!(
            "No billed lines for order {order_id}"
        )));
    }
    Ok(ok_with_message(moved, "Order completed"))
}

/// GET /api/billing/completed - 按营业日查完成单
pub async fn completed(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<CompletedQuery>,
) -> AppResult<Json<AppResponse<Vec<OrderSummary>>>> {
    let cutoff = state.config.business_day_cutoff;
    let tz = state.config.timezone;
    let today = current_business_date(cutoff, tz);
    let from = match &query.from_date {
        Some(s) => {
            let d = parse_date(s)?;
            validate_not_future(d, tz)?;
            d
        }
        None => today,
    };
    let to = match &query.to_date {
        Some(s) => parse_date(s)?,
        None => from,
    };
    let (from_ms, to_ms) = business_range_millis(from, to, cutoff, tz)?;

    let scope = floor_scope(&state, &user).await?;
    let orders = state.engine.completed_orders(from_ms, to_ms, scope).await?;
    Ok(ok(orders))
}
