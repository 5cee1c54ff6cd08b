//! Staff API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Datelike;
use serde::Deserialize;
use validator::Validate;

use shared::models::staff::{
    AttendanceDay, ROLE_ADMIN, ROLE_MANAGER, STAFF_ROLES, StaffCreate, StaffResponse, StaffUpdate,
    StaffUser,
};

use crate::auth::{CurrentUser, hash_password};
use crate::core::ServerState;
use crate::db::repository::staff;
use crate::utils::time::{month_range_millis, tz_offset_millis};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// 考勤查询参数，缺省为业务时区的当前年月
#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

fn is_known_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_MANAGER || STAFF_ROLES.contains(&role)
}

/// 经理只能操作自己名下的员工，admin 不受限
fn assert_owns(user: &CurrentUser, target: &StaffUser) -> AppResult<()> {
    if user.role == ROLE_ADMIN {
        return Ok(());
    }
    if target.parent_ref == Some(user.id) {
        return Ok(());
    }
    Err(AppError::forbidden("Not your staff member"))
}

/// GET /api/staff - 账户列表
///
/// admin 看全部，经理看自己名下的。
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<StaffResponse>>>> {
    let rows = if user.is_admin() {
        staff::find_all(state.pool()).await?
    } else {
        staff::find_by_manager(state.pool(), user.id).await?
    };
    Ok(ok(rows))
}

/// POST /api/staff - 创建账户
///
/// 经理只能建楼面角色 (server/chef/biller)，parent 强制为本人，
/// 且受 MAX_STAFF_PER_MANAGER 上限约束。admin 可另建经理。
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(mut input): Json<StaffCreate>,
) -> AppResult<Json<AppResponse<StaffResponse>>> {
    input.validate()?;
    if !is_known_role(&input.role) {
        return Err(AppError::validation(format!("Unknown role '{}'", input.role)));
    }

    if STAFF_ROLES.contains(&input.role.as_str()) {
        // 楼面角色必须挂在某个经理下
        if user.role == ROLE_MANAGER {
            input.parent_ref = Some(user.id);
        }
        let parent = input
            .parent_ref
            .ok_or_else(|| AppError::validation("parent_ref is required for floor staff"))?;

        let active = staff::count_active_by_manager(state.pool(), parent).await?;
        if active >= state.config.max_staff_per_manager {
            return Err(AppError::validation(format!(
                "Staff limit reached: maximum {} active staff per manager",
                state.config.max_staff_per_manager
            )));
        }
    } else {
        // admin/manager 账户不挂 parent
        if user.role != ROLE_ADMIN {
            return Err(AppError::forbidden("Only admin can create manager accounts"));
        }
        input.parent_ref = None;
    }

    let hash = hash_password(&input.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
    let created = staff::create(state.pool(), &input, &hash).await?;

    tracing::info!(staff_id = created.id, role = %created.role, by = user.id, "Staff account created");
    Ok(ok_with_message(created, "Staff account created"))
}

/// PUT /api/staff/{id} - 更新账户
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<StaffUpdate>,
) -> AppResult<Json<AppResponse<StaffResponse>>> {
    let target = staff::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Staff {id} not found")))?;
    assert_owns(&user, &target)?;

    if let Some(role) = &input.role {
        if !is_known_role(role) {
            return Err(AppError::validation(format!("Unknown role '{role}'")));
        }
        if user.role == ROLE_MANAGER && !STAFF_ROLES.contains(&role.as_str()) {
            return Err(AppError::forbidden("Managers can only assign floor roles"));
        }
    }
    if let Some(password) = &input.password
        && password.len() < 8
    {
        return Err(AppError::validation("Password must be at least 8 characters"));
    }

    let hash = match &input.password {
        Some(p) => Some(
            hash_password(p).map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?,
        ),
        None => None,
    };
    let updated = staff::update(state.pool(), id, &input, hash).await?;
    Ok(ok_with_message(updated, "Staff account updated"))
}

/// DELETE /api/staff/{id} - 停用账户 (软删除)
pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<()>>> {
    if id == user.id {
        return Err(AppError::validation("Cannot deactivate your own account"));
    }
    let target = staff::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Staff {id} not found")))?;
    assert_owns(&user, &target)?;

    if !staff::delete(state.pool(), id).await? {
        return Err(AppError::not_found(format!("Staff {id} is already inactive")));
    }
    tracing::info!(staff_id = id, by = user.id, "Staff account deactivated");
    Ok(ok_with_message((), "Staff account deactivated"))
}

/// GET /api/staff/me - 当前登录账户
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<StaffResponse>>> {
    let profile = staff::find_response_by_id(state.pool(), user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Account not found"))?;
    Ok(ok(profile))
}

/// GET /api/staff/{id}/attendance - 按天的活动量 (本人/所属经理/admin)
pub async fn attendance(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<AttendanceQuery>,
) -> AppResult<Json<AppResponse<Vec<AttendanceDay>>>> {
    if id != user.id {
        let target = staff::find_by_id(state.pool(), id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Staff {id} not found")))?;
        assert_owns(&user, &target)?;
    }

    let tz = state.config.timezone;
    let now = chrono::Utc::now().with_timezone(&tz);
    let year = query.year.unwrap_or_else(|| now.year());
    let month = query.month.unwrap_or_else(|| now.month());
    let (from_ms, to_ms) = month_range_millis(year, month, tz)?;

    let days = staff::attendance(state.pool(), id, from_ms, to_ms, tz_offset_millis(tz)).await?;
    Ok(ok(days))
}
