//! Permission Definitions
//!
//! Simplified RBAC permission system.
//!
//! ## 设计原则
//! - 权限由角色静态推导，不落库、不进令牌
//! - 模块化权限：按功能模块授权
//! - admin 拥有全部权限，经理拥有全部业务权限

use shared::models::staff::{ROLE_ADMIN, ROLE_BILLER, ROLE_CHEF, ROLE_MANAGER, ROLE_SERVER};

/// 权限列表（6 项）
pub const ALL_PERMISSIONS: &[&str] = &[
    "menu:manage",    // 菜单管理（菜品 增删改查）
    "cart:write",     // 点单（加菜/改量/删行/送厨）
    "kitchen:work",   // 厨房操作（认领/推进/出餐）
    "billing:manage", // 结账（送结/收款/关单）
    "staff:manage",   // 员工管理
    "reports:view",   // 报表查看
];

/// 经理角色权限（全部业务权限）
pub const MANAGER_PERMISSIONS: &[&str] = &[
    "menu:manage",
    "cart:write",
    "kitchen:work",
    "billing:manage",
    "staff:manage",
    "reports:view",
];

/// 服务员权限（点单 + 查看自己的报表）
pub const SERVER_PERMISSIONS: &[&str] = &["cart:write", "reports:view"];

/// 厨师权限
pub const CHEF_PERMISSIONS: &[&str] = &["kitchen:work", "reports:view"];

/// 收银员权限（账单流程中同时负责开单）
pub const BILLER_PERMISSIONS: &[&str] = &["cart:write", "billing:manage", "reports:view"];

/// Get the permission list for a role name
pub fn role_permissions(role: &str) -> &'static [&'static str] {
    match role {
        ROLE_ADMIN => ALL_PERMISSIONS,
        ROLE_MANAGER => MANAGER_PERMISSIONS,
        ROLE_SERVER => SERVER_PERMISSIONS,
        ROLE_CHEF => CHEF_PERMISSIONS,
        ROLE_BILLER => BILLER_PERMISSIONS,
        _ => &[],
    }
}

/// Check whether a role carries a permission
pub fn role_has(role: &str, permission: &str) -> bool {
    if role == ROLE_ADMIN {
        return true;
    }
    role_permissions(role).contains(&permission)
}

/// Validate if a permission string is valid
pub fn is_valid_permission(permission: &str) -> bool {
    ALL_PERMISSIONS.contains(&permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_carries_everything() {
        for p in ALL_PERMISSIONS {
            assert!(role_has(ROLE_ADMIN, p));
        }
    }

    #[test]
    fn server_cannot_manage_staff() {
        assert!(role_has(ROLE_SERVER, "cart:write"));
        assert!(!role_has(ROLE_SERVER, "staff:manage"));
        assert!(!role_has(ROLE_SERVER, "kitchen:work"));
    }

    #[test]
    fn biller_can_write_cart_and_bill() {
        assert!(role_has(ROLE_BILLER, "cart:write"));
        assert!(role_has(ROLE_BILLER, "billing:manage"));
        assert!(!role_has(ROLE_BILLER, "menu:manage"));
    }

    #[test]
    fn unknown_role_has_nothing() {
        assert!(!role_has("intern", "reports:view"));
        assert!(role_permissions("intern").is_empty());
    }

    #[test]
    fn permission_names_are_known() {
        assert!(is_valid_permission("cart:write"));
        assert!(!is_valid_permission("cart:*"));
    }
}
