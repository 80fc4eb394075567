use anyhow::anyhow;
use rbatis::RBatis;
use tracing::{error, info};

use crate::app_config::db::{init_db, DbConfig};
use crate::error::app_error::IngestError;
use crate::ingestion::model::fx_rate::FxRateModel;
use crate::ingestion::task::fx_rates_job::{self, IngestOutcome};

/// 加载配置并建连。配置和连接句柄都由这里构造后向下传递
async fn connect() -> Result<RBatis, IngestError> {
    let config = DbConfig::from_env()?;
    init_db(&config).await
}

/// 执行一次完整摄取。失败时带上下文记日志后原样上抛，
/// 让外部调度器拿到非零退出码
pub async fn run_ingest() -> anyhow::Result<()> {
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            error!("数据库初始化失败: {}", e);
            return Err(anyhow!(e));
        }
    };

    match fx_rates_job::run_ingest(&db).await {
        Ok(IngestOutcome::Skipped { rate_date }) => {
            info!("运行结束: 今日 {} 已是最新, 无操作", rate_date);
            Ok(())
        }
        Ok(IngestOutcome::Loaded { rate_date, rows }) => {
            info!("运行结束: {} 共写入 {} 行", rate_date, rows);
            Ok(())
        }
        Err(e) => {
            error!("摄取失败, 本次运行放弃, 等待下次调度: {}", e);
            Err(anyhow!(e))
        }
    }
}

/// 初始化 raw_fx_rates 表
pub async fn run_init_table() -> anyhow::Result<()> {
    let db = connect().await?;
    FxRateModel::new(&db).create_table().await?;
    info!("raw_fx_rates 表就绪");
    Ok(())
}

/// 连通性探活：建连后跑一条 SELECT 1，不碰业务表
pub async fn run_check_db() -> anyhow::Result<()> {
    let db = connect().await?;
    db.query("select 1", vec![]).await?;
    info!("✅ Database connection successful!");
    Ok(())
}
