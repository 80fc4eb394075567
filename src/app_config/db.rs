use std::env;

use rbatis::RBatis;
use rbdc_mysql::MysqlDriver;

use crate::error::app_error::IngestError;

/// 数据库连接配置，启动时一次性从环境变量构造并校验，之后按引用传递
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl DbConfig {
    /// 读取 DB_* 环境变量，缺失或非法直接报配置错误
    pub fn from_env() -> Result<Self, IngestError> {
        let require = |key: &str| {
            env::var(key).map_err(|_| IngestError::Config(format!("{} 未设置", key)))
        };
        let port = require("DB_PORT")?
            .parse::<u16>()
            .map_err(|_| IngestError::Config("DB_PORT 必须是端口号".to_string()))?;
        Ok(Self {
            host: require("DB_HOST")?,
            port,
            username: require("DB_USER")?,
            password: require("DB_PASSWORD")?,
            database: require("DB_NAME")?,
        })
    }

    /// 拼接 mysql 连接串
    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// 按配置建立连接池。句柄由顶层调用方持有并向下传递，不放全局静态
pub async fn init_db(config: &DbConfig) -> Result<RBatis, IngestError> {
    let rb = RBatis::new();
    rb.link(MysqlDriver {}, &config.url()).await?;
    if let Ok(pool) = rb.get_pool() {
        // 单次批量任务，不需要大连接池
        pool.set_max_open_conns(10).await;
    }
    Ok(rb)
}
