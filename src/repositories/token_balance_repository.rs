use crate::database::DbConnection;
use crate::errors::AppError;
use crate::models::db::TokenBalanceRow;
use crate::models::db::schema::token_balances;
use crate::models::{Page, TokenBalance};
use crate::repositories::base::map_diesel_error;
use crate::repositories::traits::repository::Repository;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBalanceRepository;

impl TokenBalanceRepository {
    pub fn new() -> Self {
        Self
    }

    /// 删除该代币的全部余额后重新写入
    pub async fn replace_for_token(
        &self,
        conn: &mut DbConnection,
        token_address: &str,
        balances: &[TokenBalance],
    ) -> Result<(), AppError> {
        diesel::delete(token_balances::table.filter(token_balances::token_address.eq(token_address)))
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        self.batch_save(conn, balances).await
    }

    /// 持有人列表；余额是十进制字符串，排序在调用方完成
    pub async fn holders(
        &self,
        conn: &mut DbConnection,
        token_address: &str,
    ) -> Result<Vec<TokenBalanceRow>, AppError> {
        token_balances::table
            .filter(token_balances::token_address.eq(token_address))
            .select(TokenBalanceRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }

    pub async fn find_by_address(
        &self,
        conn: &mut DbConnection,
        address: &str,
        page: Page,
    ) -> Result<Vec<TokenBalanceRow>, AppError> {
        token_balances::table
            .filter(token_balances::address.eq(address))
            .order(token_balances::token_address.asc())
            .limit(page.limit)
            .offset(page.offset)
            .select(TokenBalanceRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl Repository<TokenBalance, (String, String)> for TokenBalanceRepository {
    type Row = TokenBalanceRow;

    async fn find_by_id(
        &self,
        conn: &mut DbConnection,
        (address, token_address): (String, String),
    ) -> Result<Option<TokenBalanceRow>, AppError> {
        token_balances::table
            .find((address, token_address))
            .select(TokenBalanceRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn save(&self, conn: &mut DbConnection, balance: &TokenBalance) -> Result<(), AppError> {
        let row = TokenBalanceRow::from(balance);
        diesel::insert_into(token_balances::table)
            .values(&row)
            .on_conflict((token_balances::address, token_balances::token_address))
            .do_update()
            .set(&row)
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
