use crate::database::DbConnection;
use crate::errors::AppError;
use crate::models::db::schema::token_transfers;
use crate::models::db::{TokenTransferInsert, TokenTransferRow};
use crate::models::{Page, TokenTransfer};
use crate::repositories::base::map_diesel_error;
use crate::repositories::traits::repository::Repository;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenTransferRepository;

impl TokenTransferRepository {
    pub fn new() -> Self {
        Self
    }

    /// 代币的转账记录，最新在前
    pub async fn find_by_token(
        &self,
        conn: &mut DbConnection,
        token_address: &str,
        page: Page,
    ) -> Result<Vec<TokenTransferRow>, AppError> {
        token_transfers::table
            .filter(token_transfers::token_address.eq(token_address))
            .order((
                token_transfers::block_height.desc(),
                token_transfers::log_index.desc(),
            ))
            .limit(page.limit)
            .offset(page.offset)
            .select(TokenTransferRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }

    /// 全部转账按链上顺序返回，用于重算余额
    pub async fn history_for_token(
        &self,
        conn: &mut DbConnection,
        token_address: &str,
    ) -> Result<Vec<TokenTransferRow>, AppError> {
        token_transfers::table
            .filter(token_transfers::token_address.eq(token_address))
            .order((
                token_transfers::block_height.asc(),
                token_transfers::log_index.asc(),
            ))
            .select(TokenTransferRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }

    pub async fn count(&self, conn: &mut DbConnection) -> Result<i64, AppError> {
        token_transfers::table
            .count()
            .get_result(conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl Repository<TokenTransfer, i64> for TokenTransferRepository {
    type Row = TokenTransferRow;

    async fn find_by_id(
        &self,
        conn: &mut DbConnection,
        id: i64,
    ) -> Result<Option<TokenTransferRow>, AppError> {
        token_transfers::table
            .find(id)
            .select(TokenTransferRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn save(&self, conn: &mut DbConnection, transfer: &TokenTransfer) -> Result<(), AppError> {
        let row = TokenTransferInsert::try_from(transfer)?;
        diesel::insert_into(token_transfers::table)
            .values(&row)
            .on_conflict((token_transfers::tx_hash, token_transfers::log_index))
            .do_update()
            .set(&row)
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
