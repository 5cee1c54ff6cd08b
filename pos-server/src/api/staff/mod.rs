//! Staff API 模块
//!
//! 账户管理是经理范围的：经理只能建/改/停自己名下的员工，
//! admin 不受限。`/me` 和考勤查询对所有登录用户开放 (考勤有
//! 自己的归属检查)。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/staff", staff_routes())
}

fn staff_routes() -> Router<ServerState> {
    // 本人视角
    let self_routes = Router::new()
        .route("/me", get(handler::me))
        .route("/{id}/attendance", get(handler::attendance));

    // 账户管理
    let manage_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::remove))
        .layer(middleware::from_fn(require_permission("staff:manage")));

    self_routes.merge(manage_routes)
}
