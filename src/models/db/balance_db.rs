use crate::models::db::schema::token_balances;
use crate::models::domain::TokenBalance;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = token_balances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TokenBalanceRow {
    pub address: String,
    pub token_address: String,
    pub balance: String,
    pub updated_at: i64,
}

impl From<&TokenBalance> for TokenBalanceRow {
    fn from(b: &TokenBalance) -> Self {
        Self {
            address: b.address.clone(),
            token_address: b.token_address.clone(),
            balance: b.balance.clone(),
            updated_at: b.updated_at,
        }
    }
}
