//! Staff Repository
//!
//! 员工账户表。密码散列由 auth::password 负责，这里只存取。

use super::{RepoError, RepoResult};
use shared::models::{AttendanceDay, StaffCreate, StaffResponse, StaffUpdate, StaffUser};
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, username, display_name, phone, password_hash, role, parent_ref, is_active, created_at, updated_at FROM users";

const USER_SAFE_SELECT: &str = "SELECT id, username, display_name, phone, role, parent_ref, is_active, created_at, updated_at FROM users";

/// Find a user row by username, hash included. Login only.
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<StaffUser>> {
    let sql = format!("{USER_SELECT} WHERE username = ?");
    let row = sqlx::query_as::<_, StaffUser>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<StaffUser>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, StaffUser>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_response_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<StaffResponse>> {
    let sql = format!("{USER_SAFE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, StaffResponse>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// All accounts, admins included. Admin console only.
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<StaffResponse>> {
    let sql = format!("{USER_SAFE_SELECT} ORDER BY role, username");
    let rows = sqlx::query_as::<_, StaffResponse>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Staff reporting to one manager
pub async fn find_by_manager(pool: &SqlitePool, manager_id: i64) -> RepoResult<Vec<StaffResponse>> {
    let sql = format!("{USER_SAFE_SELECT} WHERE parent_ref = ? ORDER BY role, username");
    let rows = sqlx::query_as::<_, StaffResponse>(&sql)
        .bind(manager_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Active head count under a manager, for the staff-cap check
pub async fn count_active_by_manager(pool: &SqlitePool, manager_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE parent_ref = ? AND is_active = 1",
    )
    .bind(manager_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Create an account. `password_hash` is already argon2-hashed.
pub async fn create(
    pool: &SqlitePool,
    data: &StaffCreate,
    password_hash: &str,
) -> RepoResult<StaffResponse> {
    if find_by_username(pool, &data.username).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Username '{}' already exists",
            data.username
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO users (id, username, password_hash, display_name, phone, role, parent_ref, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)",
    )
    .bind(id)
    .bind(&data.username)
    .bind(password_hash)
    .bind(&data.display_name)
    .bind(&data.phone)
    .bind(&data.role)
    .bind(data.parent_ref)
    .bind(now)
    .execute(pool)
    .await?;

    find_response_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create staff account".into()))
}

/// Partial update. `password_hash` replaces the stored hash when present.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: &StaffUpdate,
    password_hash: Option<String>,
) -> RepoResult<StaffResponse> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET display_name = COALESCE(?1, display_name), phone = COALESCE(?2, phone), password_hash = COALESCE(?3, password_hash), role = COALESCE(?4, role), is_active = COALESCE(?5, is_active), updated_at = ?6 WHERE id = ?7",
    )
    .bind(&data.display_name)
    .bind(&data.phone)
    .bind(password_hash)
    .bind(&data.role)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Staff {id} not found")));
    }
    find_response_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Staff {id} not found")))
}

/// Soft delete: deactivated accounts keep their rows for history joins
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE users SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Per-day activity for one staffer (as server or chef) over a window.
/// `tz_offset_ms` shifts unix-millis timestamps into the venue's local day.
pub async fn attendance(
    pool: &SqlitePool,
    staff_id: i64,
    from_millis: i64,
    to_millis: i64,
    tz_offset_ms: i64,
) -> RepoResult<Vec<AttendanceDay>> {
    let rows = sqlx::query_as::<_, AttendanceDay>(
        "SELECT DATE((created_at + ?2) / 1000, 'unixepoch') AS day, COUNT(*) AS lines, COALESCE(SUM(quantity), 0) AS items FROM line_item WHERE (server_ref = ?1 OR chef_ref = ?1) AND created_at >= ?3 AND created_at < ?4 GROUP BY day ORDER BY day",
    )
    .bind(staff_id)
    .bind(tz_offset_ms)
    .bind(from_millis)
    .bind(to_millis)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
