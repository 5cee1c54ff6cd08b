//! 角色 → 查询范围推导
//!
//! 两种范围语义：
//! - 楼面范围 ([`floor_scope`])：厨房/收银屏。员工看所属经理名下
//!   所有服务员的行，经理看自己名下的，admin 看全部。
//! - 报表范围 ([`report_scope`])：统计/考勤。员工只看自己的行，
//!   经理可以按 server_id 下钻到单个员工。

use shared::models::staff::{ROLE_ADMIN, ROLE_MANAGER};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::staff;
use crate::orders::Scope;
use crate::utils::{AppError, AppResult};

/// 厨房/收银屏的范围
///
/// 员工的经理从自己的 `parent_ref` 读出；没有上级的员工按全店处理。
pub async fn floor_scope(state: &ServerState, user: &CurrentUser) -> AppResult<Scope> {
    match user.role.as_str() {
        ROLE_ADMIN => Ok(Scope::All),
        ROLE_MANAGER => Ok(Scope::Manager(user.id)),
        _ => {
            let row = staff::find_by_id(state.pool(), user.id)
                .await?
                .ok_or_else(AppError::unauthorized)?;
            Ok(row.parent_ref.map(Scope::Manager).unwrap_or(Scope::All))
        }
    }
}

/// 报表范围
///
/// `drill_server` 只对经理和 admin 生效，员工永远只看自己。
pub fn report_scope(user: &CurrentUser, drill_server: Option<i64>) -> Scope {
    match user.role.as_str() {
        ROLE_ADMIN => drill_server.map(Scope::Staff).unwrap_or(Scope::All),
        ROLE_MANAGER => drill_server
            .map(Scope::Staff)
            .unwrap_or(Scope::Manager(user.id)),
        _ => Scope::Staff(user.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::staff::{ROLE_CHEF, ROLE_SERVER};

    fn user(id: i64, role: &str) -> CurrentUser {
        CurrentUser {
            id,
            username: "t".into(),
            role: role.into(),
        }
    }

    #[test]
    fn staff_reports_are_always_their_own() {
        assert!(matches!(
            report_scope(&user(7, ROLE_SERVER), Some(99)),
            Scope::Staff(7)
        ));
        assert!(matches!(report_scope(&user(8, ROLE_CHEF), None), Scope::Staff(8)));
    }

    #[test]
    fn managers_drill_down_or_see_their_staff() {
        assert!(matches!(
            report_scope(&user(3, ROLE_MANAGER), None),
            Scope::Manager(3)
        ));
        assert!(matches!(
            report_scope(&user(3, ROLE_MANAGER), Some(7)),
            Scope::Staff(7)
        ));
    }

    #[test]
    fn admin_sees_everything_by_default() {
        assert!(matches!(report_scope(&user(1, ROLE_ADMIN), None), Scope::All));
        assert!(matches!(
            report_scope(&user(1, ROLE_ADMIN), Some(7)),
            Scope::Staff(7)
        ));
    }
}
