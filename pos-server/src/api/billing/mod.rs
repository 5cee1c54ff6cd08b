//! Billing API 模块
//!
//! 送结 → 收款 → 完成。restaurant 变体走 served → billed → completed，
//! billing 变体走 pending → checked_out → completed，共用同一组接口。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/billing", billing_routes())
}

fn billing_routes() -> Router<ServerState> {
    // 服务员送结
    let server_routes = Router::new()
        .route("/send", post(handler::send_to_bill))
        .layer(middleware::from_fn(require_permission("cart:write")));

    // 收银操作
    let biller_routes = Router::new()
        .route("/billed", get(handler::billed))
        .route("/order/{order_id}", get(handler::order_summary))
        .route("/payment-mode", post(handler::payment_mode))
        .route("/complete/{order_id}", post(handler::complete))
        .route("/completed", get(handler::completed))
        .layer(middleware::from_fn(require_permission("billing:manage")));

    server_routes.merge(biller_routes)
}
