use anyhow::Context;
use qtum_indexer::config::Config;
use qtum_indexer::log_info;
use qtum_indexer::startup::Application;
use qtum_indexer::utils::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志（全局只需调用一次）
    init_logger();

    log_info!("Starting qtum indexer...");

    // 1. 加载配置
    let config = Config::load().context("Failed to load application configuration")?;

    // 2. 构建应用实例（数据库、节点 Provider）
    let application = Application::build(config)
        .await
        .context("Application building failed (database / node initialization)")?;

    log_info!("Application build complete. Starting sync loop.");

    // 3. 运行同步循环直到 Ctrl+C
    application
        .run()
        .await
        .context("Sync service failed during runtime")?;

    Ok(())
}
