//! Statistics API Handlers
//!
//! 时间范围和角色范围在这里算好，组合进 [`LineFilter`]，
//! repository 只负责聚合形状。

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::api::scope::report_scope;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::analytics::{
    self, CategorySales, HourBucket, ItemSales, ModeRevenue, ServerStats, TableStats,
};
use crate::orders::LineFilter;
use crate::utils::time::{business_range_millis, current_business_date, parse_date};
use crate::utils::{AppError, AppResponse, AppResult, ok};

const DEFAULT_POPULAR_LIMIT: i64 = 10;

/// 看板通用查询参数
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// today (缺省) | week | month | custom
    pub range: Option<String>,
    /// custom 范围起止 (YYYY-MM-DD, 含双端)
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    /// 经理/管理员下钻到单个员工
    pub server_id: Option<i64>,
    /// popular-items 条数上限
    pub limit: Option<i64>,
}

/// 头部指标 + 客单价 (总收入 / 订单数)
#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub orders: i64,
    pub items: i64,
    pub revenue_cents: i64,
    pub average_order_cents: i64,
}

/// 阶段计数，附阶段名
#[derive(Debug, Serialize)]
pub struct StageCountResponse {
    pub status: i64,
    pub stage: String,
    pub orders: i64,
}

/// range 参数 → [from, to) 毫秒区间 (营业日边界)
///
/// week = 最近 7 个营业日，month = 最近 30 个营业日 (都含今天)。
fn time_range(state: &ServerState, query: &StatsQuery) -> AppResult<(i64, i64)> {
    let cutoff = state.config.business_day_cutoff;
    let tz = state.config.timezone;
    let today = current_business_date(cutoff, tz);

    match query.range.as_deref().unwrap_or("today") {
        "today" => business_range_millis(today, today, cutoff, tz),
        "week" => business_range_millis(today - chrono::Duration::days(6), today, cutoff, tz),
        "month" => business_range_millis(today - chrono::Duration::days(29), today, cutoff, tz),
        "custom" => {
            let from = query
                .from_date
                .as_deref()
                .ok_or_else(|| AppError::validation("from_date is required for custom range"))?;
            let to = query
                .to_date
                .as_deref()
                .ok_or_else(|| AppError::validation("to_date is required for custom range"))?;
            business_range_millis(parse_date(from)?, parse_date(to)?, cutoff, tz)
        }
        other => Err(AppError::validation(format!("Unknown range '{other}'"))),
    }
}

/// 时间范围 + 角色范围的基础过滤器
fn base_filter(state: &ServerState, user: &CurrentUser, query: &StatsQuery) -> AppResult<LineFilter> {
    let (from_ms, to_ms) = time_range(state, query)?;
    Ok(LineFilter::new()
        .created_from(from_ms)
        .created_before(to_ms)
        .scope(report_scope(user, query.server_id)))
}

/// GET /api/statistics/overview - 头部指标 (完成单)
pub async fn overview(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<OverviewResponse>>> {
    let filter = base_filter(&state, &user, &query)?.status(state.engine.variant().completed());
    let data = analytics::overview(state.pool(), &filter).await?;
    let average = if data.orders > 0 {
        data.revenue_cents / data.orders
    } else {
        0
    };
    Ok(ok(OverviewResponse {
        orders: data.orders,
        items: data.items,
        revenue_cents: data.revenue_cents,
        average_order_cents: average,
    }))
}

/// GET /api/statistics/popular-items - 销量排行
pub async fn popular_items(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<Vec<ItemSales>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT).max(1);
    let filter = base_filter(&state, &user, &query)?.status(state.engine.variant().completed());
    let rows = analytics::popular_items(state.pool(), &filter, limit).await?;
    Ok(ok(rows))
}

/// GET /api/statistics/hourly - 分时订单 (场馆本地小时)
pub async fn hourly(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<Vec<HourBucket>>>> {
    let filter = base_filter(&state, &user, &query)?.status(state.engine.variant().completed());
    let offset = crate::utils::time::tz_offset_millis(state.config.timezone);
    let rows = analytics::hourly_orders(state.pool(), &filter, offset).await?;
    Ok(ok(rows))
}

/// GET /api/statistics/tables - 桌台表现
pub async fn tables(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<Vec<TableStats>>>> {
    let filter = base_filter(&state, &user, &query)?.status(state.engine.variant().completed());
    let rows = analytics::table_performance(state.pool(), &filter).await?;
    Ok(ok(rows))
}

/// GET /api/statistics/servers - 服务员表现
pub async fn servers(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<Vec<ServerStats>>>> {
    let filter = base_filter(&state, &user, &query)?.status(state.engine.variant().completed());
    let rows = analytics::server_performance(state.pool(), &filter).await?;
    Ok(ok(rows))
}

/// GET /api/statistics/payment-modes - 按支付方式的收入
pub async fn payment_modes(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<Vec<ModeRevenue>>>> {
    let filter = base_filter(&state, &user, &query)?.status(state.engine.variant().completed());
    let rows = analytics::payment_mode_revenue(state.pool(), &filter).await?;
    Ok(ok(rows))
}

/// GET /api/statistics/stages - 流水线各阶段订单数
///
/// 不限阶段，当前范围内每个出现过的阶段一行。
pub async fn stages(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<Vec<StageCountResponse>>>> {
    let variant = state.engine.variant();
    let filter = base_filter(&state, &user, &query)?;
    let rows = analytics::stage_counts(state.pool(), &filter).await?;
    let decorated = rows
        .into_iter()
        .map(|r| StageCountResponse {
            status: r.status,
            stage: variant.stage_name(r.status).unwrap_or("unknown").to_string(),
            orders: r.orders,
        })
        .collect();
    Ok(ok(decorated))
}

/// GET /api/statistics/categories - 热门分类
///
/// 读 billed 阶段而不是 completed：送结即计入分类榜，不等关单。
pub async fn categories(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AppResponse<Vec<CategorySales>>>> {
    let filter = base_filter(&state, &user, &query)?.status(state.engine.variant().billed());
    let rows = analytics::category_sales(state.pool(), &filter).await?;
    Ok(ok(rows))
}
