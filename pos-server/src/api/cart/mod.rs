//! Cart API 模块
//!
//! 点单入口：加菜走合并算法，改量/删行按行号操作，
//! 列表支持命名的阶段过滤器。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", cart_routes())
}

fn cart_routes() -> Router<ServerState> {
    // 读取路由：登录即可
    let read_routes = Router::new().route("/", get(handler::list));

    // 写路由：需要 cart:write 权限
    let write_routes = Router::new()
        .route("/", post(handler::add))
        .route(
            "/{line_id}",
            axum::routing::put(handler::update_quantity).delete(handler::remove),
        )
        .layer(middleware::from_fn(require_permission("cart:write")));

    read_routes.merge(write_routes)
}
