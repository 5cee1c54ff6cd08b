//! Statistics API 模块
//!
//! 经营看板聚合。所有端点共享同一组查询参数:
//! 时间范围 (`range=today|week|month|custom`) + 角色范围 (经理/管理员可按
//! `server_id` 下钻)。

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/statistics", statistics_routes())
}

fn statistics_routes() -> Router<ServerState> {
    Router::new()
        .route("/overview", get(handler::overview))
        .route("/popular-items", get(handler::popular_items))
        .route("/hourly", get(handler::hourly))
        .route("/tables", get(handler::tables))
        .route("/servers", get(handler::servers))
        .route("/payment-modes", get(handler::payment_modes))
        .route("/stages", get(handler::stages))
        .route("/categories", get(handler::categories))
        .layer(middleware::from_fn(require_permission("reports:view")))
}
