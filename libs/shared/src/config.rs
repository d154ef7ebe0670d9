use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::SharedError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// 数据库连接串，例如 sqlite://users.db
    #[serde(default)]
    pub database_url: String,
    /// 路由前缀，空字符串表示挂在根路径
    pub api_prefix: String,
    /// 逗号分隔的 CORS 白名单
    pub allowed_origins: String,
    pub debug: bool,

    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl ServerConfig {
    /// 从进程环境加载配置，调用前应先执行 `init_env` 读取 .env
    pub fn load() -> Result<Self, SharedError> {
        Self::load_from(Environment::default())
    }

    pub fn load_from(env: Environment) -> Result<Self, SharedError> {
        let cfg: ServerConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("api_prefix", "/api/v1")?
            .set_default("allowed_origins", "")?
            .set_default("debug", false)?
            .set_default("db_max_connections", 5)?
            .set_default("db_acquire_timeout_secs", 8)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), SharedError> {
        if self.database_url.trim().is_empty() {
            return Err(SharedError::ConfigurationError(
                "DATABASE_URL cannot be empty".to_string(),
            ));
        }
        if self.db_max_connections == 0 {
            return Err(SharedError::ConfigurationError(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 规范化后的路由前缀: 以 `/` 开头、不以 `/` 结尾，根路径返回空串
    pub fn route_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn default_for_test() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            api_prefix: "/api/v1".to_string(),
            allowed_origins: String::new(),
            debug: true,
            db_max_connections: 1,
            db_acquire_timeout_secs: 8,
        }
    }
}
