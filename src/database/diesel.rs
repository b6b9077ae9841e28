use crate::config::DatabaseConfig;
use crate::database::migrations;
use crate::errors::AppError;
use diesel::sqlite::SqliteConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};
use futures_util::future::BoxFuture;
use std::path::Path;

pub type DbConnection = SyncConnectionWrapper<SqliteConnection>;
pub type DbPool = Pool<DbConnection>;

pub async fn create_async_db_pool(config: &DatabaseConfig) -> Result<DbPool, AppError> {
    if let Some(parent) = Path::new(&config.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let manager = AsyncDieselConnectionManager::<DbConnection>::new(config.path.clone());
    let pool = Pool::builder()
        .max_size(config.max_connections.max(1))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool(e.to_string()))?;

    Ok(pool)
}

#[async_trait::async_trait]
pub trait TransactionExecutor: Send + Sync {
    /// 在单个数据库事务内执行闭包，闭包返回 Err 时整体回滚
    async fn execute_tx<F, T>(&self, f: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut DbConnection) -> BoxFuture<'a, Result<T, AppError>> + Send;

    /// 只读查询，不开启事务
    async fn with_conn<F, T>(&self, f: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut DbConnection) -> BoxFuture<'a, Result<T, AppError>> + Send;
}

pub struct DbService {
    pub pool: DbPool,
    busy_timeout_ms: u64,
}

impl DbService {
    /// 建池并执行建表语句
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = create_async_db_pool(config).await?;
        let service = Self {
            pool,
            busy_timeout_ms: config.busy_timeout_ms,
        };
        let mut conn = service.acquire().await?;
        migrations::run(&mut conn).await?;
        drop(conn);
        Ok(service)
    }

    async fn acquire(&self) -> Result<PooledConnection<'_, DbConnection>, AppError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool(e.to_string()))?;
        // busy_timeout 与 foreign_keys 是连接级别设置，每次取出连接都要设置
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
        .await?;
        Ok(conn)
    }
}

#[async_trait::async_trait]
impl TransactionExecutor for DbService {
    async fn execute_tx<F, T>(&self, f: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut DbConnection) -> BoxFuture<'a, Result<T, AppError>> + Send,
    {
        let mut conn = self.acquire().await?;

        //直接调用 f(c) 并使用 scope_boxed(),确保 conn 的生命周期 'a 与 Future 绑定
        conn.transaction::<T, AppError, _>(|c| f(c).scope_boxed())
            .await
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut DbConnection) -> BoxFuture<'a, Result<T, AppError>> + Send,
    {
        let mut conn = self.acquire().await?;
        f(&mut *conn).await
    }
}
