//! Staff Model
//!
//! 角色层级：admin → manager → (server | chef | biller)。
//! 员工行通过 `parent_ref` 挂在所属 manager 下，统计接口用它做范围过滤。

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Role names stored on the user row
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_SERVER: &str = "server";
pub const ROLE_CHEF: &str = "chef";
pub const ROLE_BILLER: &str = "biller";

pub const STAFF_ROLES: &[&str] = &[ROLE_SERVER, ROLE_CHEF, ROLE_BILLER];

/// Staff row as stored (includes the password hash; never serialized out)
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StaffUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    /// Manager this staff member reports to (None for admin/manager)
    pub parent_ref: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Staff response (without password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StaffResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub parent_ref: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<StaffUser> for StaffResponse {
    fn from(u: StaffUser) -> Self {
        Self {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            phone: u.phone,
            role: u.role,
            parent_ref: u.parent_ref,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Create staff payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StaffCreate {
    #[validate(length(min = 3, max = 40))]
    pub username: String,
    #[validate(length(min = 1, max = 80))]
    pub display_name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// One of the role constants; validated against the caller's role
    pub role: String,
    pub parent_ref: Option<i64>,
}

/// Update staff payload (partial; password re-hashed when present)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUpdate {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 40))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Login response: token plus the caller's profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: StaffResponse,
}

/// Per-day attendance bucket (items served / lines touched by one staffer)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttendanceDay {
    pub day: String,
    pub lines: i64,
    pub items: i64,
}
