//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] / [`AppResponse`] - 统一错误与响应
//! - [`logger`] - 日志初始化
//! - [`time`] - 业务时区与营业日换算

pub mod error;
pub mod logger;
pub mod time;

pub use error::{AppError, AppResponse, AppResult};
pub use error::{ok, ok_with_message};
