//! Menu API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menu", menu_routes())
}

fn menu_routes() -> Router<ServerState> {
    // 读取路由：登录即可 (点单界面要看菜单)
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/all", get(handler::list_with_inactive))
        .route("/categories", get(handler::categories))
        .route("/{id}", get(handler::get_by_id));

    // 管理路由：需要 menu:manage 权限
    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route(
            "/{id}",
            axum::routing::put(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_permission("menu:manage")));

    read_routes.merge(manage_routes)
}
