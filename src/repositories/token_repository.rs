use crate::database::DbConnection;
use crate::errors::AppError;
use crate::models::Token;
use crate::models::db::TokenRow;
use crate::models::db::schema::tokens;
use crate::repositories::base::map_diesel_error;
use crate::repositories::traits::repository::Repository;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenRepository;

impl TokenRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_many(
        &self,
        conn: &mut DbConnection,
        addresses: &[String],
    ) -> Result<Vec<TokenRow>, AppError> {
        tokens::table
            .filter(tokens::address.eq_any(addresses))
            .select(TokenRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }

    pub async fn count(&self, conn: &mut DbConnection) -> Result<i64, AppError> {
        tokens::table
            .count()
            .get_result(conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl Repository<Token, String> for TokenRepository {
    type Row = TokenRow;

    async fn find_by_id(&self, conn: &mut DbConnection, address: String) -> Result<Option<TokenRow>, AppError> {
        tokens::table
            .find(address)
            .select(TokenRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    /// 元数据只写一次，已存在时不刷新
    async fn save(&self, conn: &mut DbConnection, token: &Token) -> Result<(), AppError> {
        diesel::insert_into(tokens::table)
            .values(TokenRow::from(token))
            .on_conflict(tokens::address)
            .do_nothing()
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
