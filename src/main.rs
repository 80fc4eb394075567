use clap::{Parser, Subcommand};
use dotenv::dotenv;

use fx_ingest::app::bootstrap;
use fx_ingest::app_config::log::setup_logging;

/// 每日外汇汇率摄取任务
#[derive(Parser)]
#[command(name = "fx-ingest", about = "每日外汇汇率摄取，落库 raw_fx_rates")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 执行一次完整摄取（默认）
    Ingest,
    /// 初始化 raw_fx_rates 表
    InitTable,
    /// 数据库连通性检查
    CheckDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    setup_logging()?;

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Ingest) {
        Command::Ingest => bootstrap::run_ingest().await,
        Command::InitTable => bootstrap::run_init_table().await,
        Command::CheckDb => bootstrap::run_check_db().await,
    }
}
