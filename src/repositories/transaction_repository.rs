use crate::database::DbConnection;
use crate::errors::AppError;
use crate::models::db::TransactionRow;
use crate::models::db::schema::transactions;
use crate::models::{Page, Transaction};
use crate::repositories::base::map_diesel_error;
use crate::repositories::traits::repository::Repository;
use async_trait::async_trait;
use diesel::{BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionRepository;

impl TransactionRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_block(
        &self,
        conn: &mut DbConnection,
        height: i64,
    ) -> Result<Vec<TransactionRow>, AppError> {
        transactions::table
            .filter(transactions::block_height.eq(height))
            .order(transactions::tx_index.asc())
            .select(TransactionRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }

    /// from 或 to 等于该地址的交易，按 (高度, 序号) 倒序分页
    pub async fn find_by_address(
        &self,
        conn: &mut DbConnection,
        address: &str,
        page: Page,
    ) -> Result<Vec<TransactionRow>, AppError> {
        transactions::table
            .filter(
                transactions::from_address
                    .eq(address)
                    .or(transactions::to_address.eq(address)),
            )
            .order((transactions::block_height.desc(), transactions::tx_index.desc()))
            .limit(page.limit)
            .offset(page.offset)
            .select(TransactionRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }

    pub async fn count(&self, conn: &mut DbConnection) -> Result<i64, AppError> {
        transactions::table
            .count()
            .get_result(conn)
            .await
            .map_err(map_diesel_error)
    }

    /// 创建过的合约数量
    pub async fn count_contracts(&self, conn: &mut DbConnection) -> Result<i64, AppError> {
        transactions::table
            .select(diesel::dsl::count_distinct(transactions::contract_address))
            .get_result(conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl Repository<Transaction, String> for TransactionRepository {
    type Row = TransactionRow;

    async fn find_by_id(
        &self,
        conn: &mut DbConnection,
        hash: String,
    ) -> Result<Option<TransactionRow>, AppError> {
        transactions::table
            .find(hash)
            .select(TransactionRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn save(&self, conn: &mut DbConnection, tx: &Transaction) -> Result<(), AppError> {
        let row = TransactionRow::try_from(tx)?;
        diesel::insert_into(transactions::table)
            .values(&row)
            .on_conflict(transactions::hash)
            .do_update()
            .set(&row)
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
