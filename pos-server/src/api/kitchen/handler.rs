//! Kitchen API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::models::line_item::{BulkTransition, KitchenLine, LineItem};

use crate::api::scope::floor_scope;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// 送厨请求。`server_ref` 缺省为当前登录用户。
#[derive(Debug, Deserialize, Validate)]
pub struct SendToKitchenRequest {
    #[validate(length(min = 1, message = "Table reference is required"))]
    pub table_ref: String,
    pub server_ref: Option<i64>,
}

/// 按行送厨请求
#[derive(Debug, Deserialize, Validate)]
pub struct SendSelectedRequest {
    #[validate(length(min = 1, message = "At least one line id is required"))]
    pub line_ids: Vec<i64>,
}

/// 阶段推进请求。`stage` 接受名称 (`preparing`) 或数字码。
#[derive(Debug, Deserialize)]
pub struct StageUpdateRequest {
    pub stage: String,
}

/// GET /api/kitchen/display - 厨房显示屏
///
/// 范围按角色推导: 厨师/服务员看所属经理名下的楼面。
pub async fn display(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<KitchenLine>>>> {
    let scope = floor_scope(&state, &user).await?;
    let lines = state.engine.kitchen_display(scope).await?;
    Ok(ok(lines))
}

/// POST /api/kitchen/claim/{line_id} - 厨师认领 (kitchen → preparing)
pub async fn claim(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(line_id): Path<i64>,
) -> AppResult<Json<AppResponse<LineItem>>> {
    let line = state.engine.claim_line(line_id, user.id).await?;
    Ok(ok_with_message(line, "Line claimed"))
}

/// PUT /api/kitchen/stage/{line_id} - 按转换表推进单行
pub async fn update_stage(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(line_id): Path<i64>,
    Json(input): Json<StageUpdateRequest>,
) -> AppResult<Json<AppResponse<LineItem>>> {
    let variant = state.engine.variant();
    let to = variant
        .parse_stage(&input.stage)
        .ok_or_else(|| AppError::validation(format!("Unknown stage '{}'", input.stage)))?;
    let line = state.engine.update_stage(line_id, to, Some(user.id)).await?;
    Ok(ok(line))
}

/// POST /api/kitchen/send - 整桌送厨 (cart → kitchen)
pub async fn send_to_kitchen(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(input): Json<SendToKitchenRequest>,
) -> AppResult<Json<AppResponse<BulkTransition>>> {
    input.validate()?;
    let server_ref = input.server_ref.unwrap_or(user.id);
    let moved = state.engine.send_to_kitchen(&input.table_ref, server_ref).await?;
    if moved.moved == 0 {
        return Err(AppError::not_found(format!(
            "No cart lines for table {}",
            input.table_ref
        )));
    }
    Ok(ok_with_message(moved, "Order sent to kitchen"))
}

/// POST /api/kitchen/send-selected - 按行送厨
pub async fn send_selected(
    State(state): State<ServerState>,
    Json(input): Json<SendSelectedRequest>,
) -> AppResult<Json<AppResponse<BulkTransition>>> {
    input.validate()?;
    let moved = state.engine.send_selected(&input.line_ids).await?;
    if moved.moved == 0 {
        return Err(AppError::not_found("No matching cart lines to send"));
    }
    Ok(ok_with_message(moved, "Selected lines sent to kitchen"))
}

/// POST /api/kitchen/served/{line_id} - 出餐
///
/// kitchen / preparing / ready 任一阶段都可直接标记已上桌。
pub async fn mark_served(
    State(state): State<ServerState>,
    Path(line_id): Path<i64>,
) -> AppResult<Json<AppResponse<LineItem>>> {
    let line = state.engine.mark_served(line_id).await?;
    Ok(ok_with_message(line, "Line served"))
}
