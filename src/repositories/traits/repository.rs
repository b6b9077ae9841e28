use crate::database::DbConnection;
use crate::errors::AppError;
use async_trait::async_trait;

/// 仓储无状态，连接由调用方传入，便于多个仓储共用同一个事务
#[async_trait]
pub trait Repository<T, ID>: Send + Sync
where
    T: Send + Sync,
    ID: Send + 'static,
{
    type Row: Send;

    async fn find_by_id(&self, conn: &mut DbConnection, id: ID)
    -> Result<Option<Self::Row>, AppError>;

    /// 按自然主键 upsert
    async fn save(&self, conn: &mut DbConnection, entity: &T) -> Result<(), AppError>;

    async fn batch_save(&self, conn: &mut DbConnection, entities: &[T]) -> Result<(), AppError> {
        for entity in entities {
            self.save(conn, entity).await?;
        }
        Ok(())
    }
}
