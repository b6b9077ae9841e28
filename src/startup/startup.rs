use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use crate::config::Config;
use crate::database::DbService;
use crate::errors::AppError;
use crate::infrastructure::provider::{ChainProvider, QtumProvider, RetryAdapter};
use crate::{log_error, log_info};
use crate::services::{BlockService, QueryService};

/// 应用程序启动与管理结构体（后台同步服务）
pub struct Application {
    pub block_service: Arc<BlockService>,
    pub query_service: Arc<QueryService>,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl Application {
    /// 初始化数据库与节点连接，不启动同步
    pub async fn build(config: Config) -> Result<Self> {
        let db_service = Arc::new(DbService::connect(&config.database).await?);
        info!("SQLite database ready at {}", config.database.path);

        // 节点 Provider 外面包一层重试
        let node = Arc::new(QtumProvider::new(&config.node)?);
        let provider = Arc::new(RetryAdapter::new(
            node,
            config.node.max_retries,
            Duration::from_millis(config.node.base_delay_ms),
        )) as Arc<dyn ChainProvider>;

        let block_service = Arc::new(BlockService::new(
            config.sync.clone(),
            db_service.clone(),
            provider.clone(),
        ));
        let query_service = Arc::new(QueryService::new(db_service, provider));
        Ok(Self {
            block_service,
            query_service,
        })
    }

    /// 启动同步循环，Ctrl+C 后等待当前区块提交完再退出
    pub async fn run(self) -> anyhow::Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        match self.query_service.last_indexed_height().await {
            Ok(Some(height)) => log_info!("从游标 {} 继续同步", height),
            Ok(None) => log_info!("没有游标，从配置的起始高度开始同步"),
            Err(e) => tracing::warn!("读取游标失败: {}", e),
        }

        let service = self.block_service.clone();
        let mut worker = tokio::spawn(async move { service.run(shutdown_rx).await });
        log_info!("✔️ Sync loop started");

        tokio::select! {
            joined = &mut worker => {
                // 同步循环只会因退出信号返回，提前结束说明任务崩溃
                match joined {
                    Ok(()) => log_error!("同步任务意外结束"),
                    Err(e) => log_error!("同步任务异常终止: {}", e),
                }
                anyhow::bail!("sync worker stopped before shutdown");
            }
            signal = tokio::signal::ctrl_c() => signal?,
        }
        log_info!("⚠️  Received shutdown signal, waiting for in-flight block...");
        shutdown_tx.send(true)?;
        worker.await?;

        if let Ok(height) = self.query_service.last_indexed_height().await {
            info!("Shutdown complete, last indexed height {:?}", height);
        }
        Ok(())
    }
}
