//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::models::menu_item::{MenuItem, MenuItemCreate, MenuItemUpdate};

use crate::core::ServerState;
use crate::db::repository::menu;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// 菜单列表查询参数
#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    /// 按分类过滤 (可选)
    pub category: Option<String>,
}

/// GET /api/menu - 获取在售菜品 (可按分类过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<MenuQuery>,
) -> AppResult<Json<AppResponse<Vec<MenuItem>>>> {
    let mut items = menu::find_all(state.pool(), false).await?;
    if let Some(category) = &query.category {
        items.retain(|i| &i.category == category);
    }
    Ok(ok(items))
}

/// GET /api/menu/all - 获取全部菜品 (含下架)
pub async fn list_with_inactive(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<MenuItem>>>> {
    let items = menu::find_all(state.pool(), true).await?;
    Ok(ok(items))
}

/// GET /api/menu/categories - 获取在售菜品的分类列表
pub async fn categories(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<String>>>> {
    let categories = menu::categories(state.pool()).await?;
    Ok(ok(categories))
}

/// GET /api/menu/:id - 获取单个菜品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = menu::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Menu item {}", id)))?;
    Ok(ok(item))
}

/// POST /api/menu - 新建菜品
pub async fn create(
    State(state): State<ServerState>,
    Json(data): Json<MenuItemCreate>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    data.validate()?;
    let item = menu::create(state.pool(), data).await?;
    tracing::info!(item_id = item.id, name = %item.name, "Menu item created");
    Ok(ok(item))
}

/// PUT /api/menu/:id - 更新菜品 (部分字段)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(data): Json<MenuItemUpdate>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    if let Some(price) = data.price_cents
        && price < 0
    {
        return Err(AppError::validation("price_cents must not be negative"));
    }
    let item = menu::update(state.pool(), id, data).await?;
    Ok(ok(item))
}

/// DELETE /api/menu/:id - 下架菜品 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<()>>> {
    let removed = menu::delete(state.pool(), id).await?;
    if !removed {
        return Err(AppError::not_found(format!("Menu item {}", id)));
    }
    Ok(ok_with_message((), "Menu item deactivated"))
}
