//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录认证接口
//! - [`menu`] - 菜单管理接口
//! - [`cart`] - 点单接口 (加菜/改量/删行/列表)
//! - [`kitchen`] - 厨房显示与流转接口
//! - [`billing`] - 结账接口
//! - [`statistics`] - 经营统计接口
//! - [`staff`] - 员工管理接口

pub mod auth;
pub mod health;

pub mod billing;
pub mod cart;
pub mod kitchen;
pub mod menu;
pub mod scope;
pub mod staff;
pub mod statistics;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
