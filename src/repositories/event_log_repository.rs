use crate::database::DbConnection;
use crate::errors::AppError;
use crate::models::db::schema::event_logs;
use crate::models::db::{EventLogInsert, EventLogRow};
use crate::models::{EventLog, Page};
use crate::repositories::base::map_diesel_error;
use crate::repositories::traits::repository::Repository;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Copy, Default)]
pub struct EventLogRepository;

impl EventLogRepository {
    pub fn new() -> Self {
        Self
    }

    /// 合约发出的日志，按 (高度, log_index) 倒序分页
    pub async fn find_by_address(
        &self,
        conn: &mut DbConnection,
        address: &str,
        page: Page,
    ) -> Result<Vec<EventLogRow>, AppError> {
        event_logs::table
            .filter(event_logs::address.eq(address))
            .order((event_logs::block_height.desc(), event_logs::log_index.desc()))
            .limit(page.limit)
            .offset(page.offset)
            .select(EventLogRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }

    pub async fn find_by_tx(
        &self,
        conn: &mut DbConnection,
        tx_hash: &str,
    ) -> Result<Vec<EventLogRow>, AppError> {
        event_logs::table
            .filter(event_logs::tx_hash.eq(tx_hash))
            .order(event_logs::log_index.asc())
            .select(EventLogRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl Repository<EventLog, i64> for EventLogRepository {
    type Row = EventLogRow;

    async fn find_by_id(&self, conn: &mut DbConnection, id: i64) -> Result<Option<EventLogRow>, AppError> {
        event_logs::table
            .find(id)
            .select(EventLogRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    /// (tx_hash, log_index) 唯一，重复写入覆盖
    async fn save(&self, conn: &mut DbConnection, log: &EventLog) -> Result<(), AppError> {
        let row = EventLogInsert::try_from(log)?;
        diesel::insert_into(event_logs::table)
            .values(&row)
            .on_conflict((event_logs::tx_hash, event_logs::log_index))
            .do_update()
            .set(&row)
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
