use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::orders::OrderEngine;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是整个服务的核心数据结构，以浅拷贝在 handler 间共享。
///
/// # 组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | SQLite 连接池 |
/// | engine | OrderEngine | 订单状态引擎 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 数据库服务
    pub db: DbService,
    /// 订单状态引擎 (流程变体来自配置)
    pub engine: OrderEngine,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`ServerState::initialize`] 代替
    pub fn new(config: Config, db: DbService, engine: OrderEngine, jwt_service: Arc<JwtService>) -> Self {
        Self {
            config,
            db,
            engine,
            jwt_service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (数据库目录、日志目录)
    /// 2. 数据库 (work_dir/database/pos.db，执行迁移)
    /// 3. 订单引擎与 JWT 服务
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_path();
        let db = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        let engine = OrderEngine::new(db.pool.clone(), config.flow);
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self::new(config.clone(), db, engine, jwt_service)
    }

    /// 获取连接池
    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
