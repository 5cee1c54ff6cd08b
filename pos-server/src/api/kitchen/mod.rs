//! Kitchen API 模块
//!
//! 厨房显示屏查询与行流转。账单流程 (billing variant) 下
//! 引擎会拒绝这些操作。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/kitchen", kitchen_routes())
}

fn kitchen_routes() -> Router<ServerState> {
    // 显示屏：登录即可
    let read_routes = Router::new().route("/display", get(handler::display));

    // 厨师操作：认领、推进
    let chef_routes = Router::new()
        .route("/claim/{line_id}", post(handler::claim))
        .route("/stage/{line_id}", put(handler::update_stage))
        .layer(middleware::from_fn(require_permission("kitchen:work")));

    // 服务员操作：送厨、出餐
    let server_routes = Router::new()
        .route("/send", post(handler::send_to_kitchen))
        .route("/send-selected", post(handler::send_selected))
        .route("/served/{line_id}", post(handler::mark_served))
        .layer(middleware::from_fn(require_permission("cart:write")));

    read_routes.merge(chef_routes).merge(server_routes)
}
