use crate::errors::AppError;
use crate::models::db::schema::event_logs;
use crate::models::domain::EventLog;
use crate::utils::to_i64;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = event_logs)]
#[diesel(treat_none_as_null = true)]
pub struct EventLogInsert {
    pub tx_hash: String,
    pub log_index: i32,
    pub address: String,
    pub topic0: Option<String>,
    pub topic1: Option<String>,
    pub topic2: Option<String>,
    pub topic3: Option<String>,
    pub data: String,
    pub block_height: i64,
    pub timestamp: i64,
    pub decoded_name: Option<String>,
    pub decoded_args: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = event_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventLogRow {
    pub id: i64,
    pub tx_hash: String,
    pub log_index: i32,
    pub address: String,
    pub topic0: Option<String>,
    pub topic1: Option<String>,
    pub topic2: Option<String>,
    pub topic3: Option<String>,
    pub data: String,
    pub block_height: i64,
    pub timestamp: i64,
    pub decoded_name: Option<String>,
    pub decoded_args: Option<String>,
}

impl TryFrom<&EventLog> for EventLogInsert {
    type Error = AppError;

    fn try_from(log: &EventLog) -> Result<Self, Self::Error> {
        // 最多 4 个 topic 槽位
        let topic = |i: usize| log.topics.get(i).cloned();
        Ok(Self {
            tx_hash: log.tx_hash.clone(),
            log_index: i32::try_from(log.log_index)?,
            address: log.address.clone(),
            topic0: topic(0),
            topic1: topic(1),
            topic2: topic(2),
            topic3: topic(3),
            data: log.data.clone(),
            block_height: to_i64(log.block_height, "log.block_height")?,
            timestamp: log.timestamp,
            decoded_name: log.decoded.as_ref().map(|d| d.name.clone()),
            decoded_args: log.decoded.as_ref().map(|d| d.args.to_string()),
        })
    }
}
