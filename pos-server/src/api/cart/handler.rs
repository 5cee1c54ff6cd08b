//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::models::line_item::{AddItemInput, AddItemOutcome, CartLine, LineItem, QuantityUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::LineFilter;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// 点单列表查询参数
#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub table_ref: String,
    /// 缺省为当前登录用户
    pub server_ref: Option<i64>,
    /// 命名过滤器: `pending` (待结账) | `menu` (每个菜品最新的一行)
    /// | 阶段名 (如 `kitchen`)。缺省列出所有未送结的行。
    pub status: Option<String>,
}

/// POST /api/cart - 加菜 (合并算法)
///
/// 同一 (桌, 服务员, 菜品) 已有未下单的行时合并数量，否则插入新行并
/// 复用该桌未结订单的 order_id。
pub async fn add(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(input): Json<AddItemInput>,
) -> AppResult<Json<AppResponse<AddItemOutcome>>> {
    input.validate()?;
    let server_ref = input.server_ref.unwrap_or(user.id);
    let outcome = state.engine.add_item(&input, server_ref).await?;

    let message = if outcome.merged {
        "Item quantity merged"
    } else {
        "Item added to cart"
    };
    Ok(ok_with_message(outcome, message))
}

/// GET /api/cart - 当前桌台/服务员的点单列表
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<CartQuery>,
) -> AppResult<Json<AppResponse<Vec<CartLine>>>> {
    let server_ref = query.server_ref.unwrap_or(user.id);
    let variant = state.engine.variant();

    let lines = match query.status.as_deref() {
        // 每个菜品最新的未下单行 (点单界面的数量角标)
        Some("menu") => state.engine.menu_view(&query.table_ref, server_ref).await?,
        // 已上菜、等待送结的行
        Some("pending") => {
            let filter = LineFilter::new()
                .table_ref(&query.table_ref)
                .server_ref(server_ref)
                .status(variant.bill_source());
            state.engine.lines(&filter).await?
        }
        // 显式阶段名
        Some(name) => {
            let code = variant
                .parse_stage(name)
                .ok_or_else(|| AppError::validation(format!("Unknown stage '{}'", name)))?;
            let filter = LineFilter::new()
                .table_ref(&query.table_ref)
                .server_ref(server_ref)
                .status(code);
            state.engine.lines(&filter).await?
        }
        // 缺省: 所有未送结的行
        None => {
            let filter = LineFilter::new()
                .table_ref(&query.table_ref)
                .server_ref(server_ref)
                .status_below(variant.billed());
            state.engine.lines(&filter).await?
        }
    };

    Ok(ok(lines))
}

/// PUT /api/cart/:line_id - 修改数量 (<= 0 时删除该行)
pub async fn update_quantity(
    State(state): State<ServerState>,
    Path(line_id): Path<i64>,
    Json(data): Json<QuantityUpdate>,
) -> AppResult<Json<AppResponse<Option<LineItem>>>> {
    let updated = state.engine.update_quantity(line_id, data.quantity).await?;
    match updated {
        Some(line) => Ok(ok_with_message(Some(line), "Quantity updated")),
        None => Ok(ok_with_message(None, "Line removed")),
    }
}

/// DELETE /api/cart/:line_id - 删除一行
pub async fn remove(
    State(state): State<ServerState>,
    Path(line_id): Path<i64>,
) -> AppResult<Json<AppResponse<()>>> {
    state.engine.remove_line(line_id).await?;
    Ok(ok_with_message((), "Item removed from cart"))
}
