use crate::models::db::schema::tokens;
use crate::models::domain::Token;
use crate::models::domain::token::DEFAULT_DECIMALS;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TokenRow {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i32,
    pub total_supply: String,
}

impl From<&Token> for TokenRow {
    fn from(token: &Token) -> Self {
        Self {
            address: token.address.clone(),
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            decimals: i32::from(token.decimals),
            total_supply: token.total_supply.clone(),
        }
    }
}

impl From<TokenRow> for Token {
    fn from(row: TokenRow) -> Self {
        Self {
            address: row.address,
            name: row.name,
            symbol: row.symbol,
            decimals: u8::try_from(row.decimals).unwrap_or(DEFAULT_DECIMALS),
            total_supply: row.total_supply,
        }
    }
}
