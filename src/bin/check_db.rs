use dotenv::dotenv;

use fx_ingest::app::bootstrap;
use fx_ingest::app_config::log::setup_logging;

/// 独立的数据库连通性探活，等价于主程序的 check-db 子命令，
/// 部署前用来确认配置里的库可达
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    setup_logging()?;
    bootstrap::run_check_db().await
}
