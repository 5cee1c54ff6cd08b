use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use chrono_tz::Tz;
use shared::flow::FlowVariant;

use crate::auth::JwtConfig;
use crate::utils::time::parse_cutoff;

/// 服务器配置 - POS 后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | POS_FLOW | restaurant | 业务流程: restaurant \| billing |
/// | POS_TIMEZONE | Europe/Madrid | 业务时区 (IANA 名称) |
/// | BUSINESS_DAY_CUTOFF | 00:00 | 营业日切换时刻 (HH:MM) |
/// | MAX_STAFF_PER_MANAGER | 50 | 每个经理可管理的在职员工上限 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// JWT 相关变量见 [`JwtConfig`]。
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/pos POS_FLOW=billing HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 业务流程变体 (restaurant | billing)
    pub flow: FlowVariant,
    /// 业务时区，统计和考勤按此换算
    pub timezone: Tz,
    /// 营业日切换时刻 (之前的时间算前一营业日)
    pub business_day_cutoff: NaiveTime,
    /// 每个经理可管理的在职员工上限
    pub max_staff_per_manager: i64,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或解析失败，使用默认值
    pub fn from_env() -> Self {
        let flow = match std::env::var("POS_FLOW") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Unknown POS_FLOW '{}', falling back to restaurant", raw);
                FlowVariant::Restaurant
            }),
            Err(_) => FlowVariant::Restaurant,
        };

        let timezone = match std::env::var("POS_TIMEZONE") {
            Ok(raw) => raw.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!("Unknown POS_TIMEZONE '{}', falling back to Europe/Madrid", raw);
                chrono_tz::Europe::Madrid
            }),
            Err(_) => chrono_tz::Europe::Madrid,
        };

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            flow,
            timezone,
            business_day_cutoff: parse_cutoff(
                &std::env::var("BUSINESS_DAY_CUTOFF").unwrap_or_else(|_| "00:00".into()),
            ),
            max_staff_per_manager: std::env::var("MAX_STAFF_PER_MANAGER")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(50),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16, flow: FlowVariant) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.flow = flow;
        config
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        Path::new(&self.work_dir).join("database")
    }

    /// 数据库文件路径 (work_dir/database/pos.db)
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("pos.db")
    }

    /// 日志目录 (work_dir/logs)
    pub fn logs_dir(&self) -> PathBuf {
        Path::new(&self.work_dir).join("logs")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_selected_fields() {
        let config = Config::with_overrides("/tmp/pos-test", 9099, FlowVariant::Billing);
        assert_eq!(config.work_dir, "/tmp/pos-test");
        assert_eq!(config.http_port, 9099);
        assert_eq!(config.flow, FlowVariant::Billing);
    }

    #[test]
    fn database_path_nests_under_work_dir() {
        let config = Config::with_overrides("/tmp/pos-test", 3000, FlowVariant::Restaurant);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/pos-test/database/pos.db")
        );
    }
}
