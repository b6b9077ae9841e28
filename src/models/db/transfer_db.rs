use crate::errors::AppError;
use crate::models::db::schema::token_transfers;
use crate::models::domain::TokenTransfer;
use crate::utils::to_i64;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = token_transfers)]
pub struct TokenTransferInsert {
    pub tx_hash: String,
    pub log_index: i32,
    pub token_address: String,
    pub from_address: String,
    pub to_address: String,
    pub value: String,
    pub block_height: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = token_transfers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TokenTransferRow {
    pub id: i64,
    pub tx_hash: String,
    pub log_index: i32,
    pub token_address: String,
    pub from_address: String,
    pub to_address: String,
    pub value: String,
    pub block_height: i64,
    pub timestamp: i64,
}

impl TryFrom<&TokenTransfer> for TokenTransferInsert {
    type Error = AppError;

    fn try_from(transfer: &TokenTransfer) -> Result<Self, Self::Error> {
        Ok(Self {
            tx_hash: transfer.tx_hash.clone(),
            log_index: i32::try_from(transfer.log_index)?,
            token_address: transfer.token_address.clone(),
            from_address: transfer.from_address.clone(),
            to_address: transfer.to_address.clone(),
            value: transfer.value.clone(),
            block_height: to_i64(transfer.block_height, "transfer.block_height")?,
            timestamp: transfer.timestamp,
        })
    }
}
