use crate::database::DbConnection;
use crate::errors::AppError;
use crate::infrastructure::protocol::constants::CURSOR_KEY;
use crate::models::db::schema::sync_state;
use crate::repositories::base::map_diesel_error;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::RunQueryDsl;

/// 同步游标：最后一个完整写入的区块高度
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncStateRepository;

impl SyncStateRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_cursor(&self, conn: &mut DbConnection) -> Result<Option<u64>, AppError> {
        let value = sync_state::table
            .find(CURSOR_KEY)
            .select(sync_state::value)
            .first::<i64>(conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        value
            .map(|v| u64::try_from(v).map_err(AppError::from))
            .transpose()
    }

    pub async fn set_cursor(&self, conn: &mut DbConnection, height: u64) -> Result<(), AppError> {
        let height = i64::try_from(height)?;
        diesel::insert_into(sync_state::table)
            .values((sync_state::key.eq(CURSOR_KEY), sync_state::value.eq(height)))
            .on_conflict(sync_state::key)
            .do_update()
            .set(sync_state::value.eq(height))
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
