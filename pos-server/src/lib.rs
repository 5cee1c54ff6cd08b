//! POS Server - 轻量餐饮/零售订单管理后端
//!
//! # 架构概述
//!
//! 本模块是 POS Server 的主入口，提供以下核心功能：
//!
//! - **订单引擎** (`orders`): 购物车合并、阶段状态机、并发安全的批量流转
//! - **数据库** (`db`): 嵌入式 SQLite 存储与仓储层
//! - **认证** (`auth`): JWT + Argon2 认证体系，角色推导权限
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! pos-server/src/
//! ├── core/          # 配置、状态、HTTP 服务器
//! ├── auth/          # JWT 认证、权限
//! ├── orders/        # 订单状态引擎
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层与仓储
//! └── utils/         # 错误、日志、时间工具
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderEngine, Scope};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    ____  ____  _____    _____
   / __ \/ __ \/ ___/   / ___/___  ______   _____  _____
  / /_/ / / / /\__ \    \__ \/ _ \/ ___/ | / / _ \/ ___/
 / ____/ /_/ /___/ /   ___/ /  __/ /   | |/ /  __/ /
/_/    \____//____/   /____/\___/_/    |___/\___/_/
    "#
    );
}
