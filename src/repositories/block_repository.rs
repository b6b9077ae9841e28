use crate::database::DbConnection;
use crate::errors::AppError;
use crate::models::Block;
use crate::models::db::BlockRow;
use crate::models::db::schema::blocks;
use crate::repositories::base::map_diesel_error;
use crate::repositories::traits::repository::Repository;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRepository;

impl BlockRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_hash(
        &self,
        conn: &mut DbConnection,
        hash: &str,
    ) -> Result<Option<BlockRow>, AppError> {
        blocks::table
            .filter(blocks::hash.eq(hash))
            .select(BlockRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    /// 最新 N 个区块，高度倒序
    pub async fn latest(&self, conn: &mut DbConnection, limit: i64) -> Result<Vec<BlockRow>, AppError> {
        blocks::table
            .order(blocks::height.desc())
            .limit(limit)
            .select(BlockRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)
    }

    pub async fn max_height(&self, conn: &mut DbConnection) -> Result<Option<i64>, AppError> {
        blocks::table
            .select(diesel::dsl::max(blocks::height))
            .get_result::<Option<i64>>(conn)
            .await
            .map_err(map_diesel_error)
    }

    pub async fn count(&self, conn: &mut DbConnection) -> Result<i64, AppError> {
        blocks::table
            .count()
            .get_result(conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl Repository<Block, i64> for BlockRepository {
    type Row = BlockRow;

    async fn find_by_id(&self, conn: &mut DbConnection, height: i64) -> Result<Option<BlockRow>, AppError> {
        blocks::table
            .find(height)
            .select(BlockRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn save(&self, conn: &mut DbConnection, block: &Block) -> Result<(), AppError> {
        let row = BlockRow::try_from(block)?;
        diesel::insert_into(blocks::table)
            .values(&row)
            .on_conflict(blocks::height)
            .do_update()
            .set(&row)
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
