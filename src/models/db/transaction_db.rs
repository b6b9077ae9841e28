use crate::errors::AppError;
use crate::models::db::schema::transactions;
use crate::models::domain::Transaction;
use crate::utils::{opt_to_i64, to_i64};
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TransactionRow {
    pub hash: String,
    pub block_height: i64,
    pub block_hash: String,
    pub tx_index: i32,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub value: String,
    pub gas_limit: Option<i64>,
    pub gas_price: Option<i64>,
    pub gas_used: Option<i64>,
    pub input_data: Option<String>,
    pub status: i16,
    pub contract_address: Option<String>,
    pub timestamp: i64,
}

impl TryFrom<&Transaction> for TransactionRow {
    type Error = AppError;

    fn try_from(tx: &Transaction) -> Result<Self, Self::Error> {
        Ok(Self {
            hash: tx.hash.clone(),
            block_height: to_i64(tx.block_height, "tx.block_height")?,
            block_hash: tx.block_hash.clone(),
            tx_index: i32::try_from(tx.tx_index)?,
            from_address: tx.from_address.clone(),
            to_address: tx.to_address.clone(),
            value: tx.value.clone(),
            gas_limit: opt_to_i64(tx.gas_limit, "tx.gas_limit")?,
            gas_price: opt_to_i64(tx.gas_price, "tx.gas_price")?,
            gas_used: opt_to_i64(tx.gas_used, "tx.gas_used")?,
            input_data: tx.input_data.clone(),
            status: tx.status.as_i16(),
            contract_address: tx.contract_address.clone(),
            timestamp: tx.timestamp,
        })
    }
}
