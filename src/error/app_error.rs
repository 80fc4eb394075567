use thiserror::Error;

/// 摄取流水线错误，失败即终止本次运行，不做重试
#[derive(Error, Debug)]
pub enum IngestError {
    /// 传输层错误（连接失败、超时、非 2xx）
    #[error("传输错误: {0}")]
    Transport(String),

    /// 上游接口可达但返回非 success 状态，保留完整响应体
    #[error("上游接口错误: {0}")]
    Upstream(String),

    /// 数据校验错误（空汇率、非正汇率），整批拒绝
    #[error("数据校验错误: {0}")]
    Validation(String),

    /// 数据库错误（连接失败、事务失败），事务已回滚
    #[error("数据库错误: {0}")]
    Storage(String),

    /// 启动配置错误（缺少必要的环境变量）
    #[error("配置错误: {0}")]
    Config(String),
}

/// 把 reqwest 的错误归入传输错误
impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Transport(err.to_string())
    }
}

/// 把 rbatis 的错误归入数据库错误
impl From<rbatis::Error> for IngestError {
    fn from(err: rbatis::Error) -> Self {
        IngestError::Storage(err.to_string())
    }
}
