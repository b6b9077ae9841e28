use crate::database::DbConnection;
use crate::errors::AppError;
use crate::models::db::VerifiedContractRow;
use crate::models::db::schema::verified_contracts;
use crate::repositories::base::map_diesel_error;
use crate::repositories::traits::repository::Repository;
use async_trait::async_trait;
use diesel::{OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

/// 已验证合约，由验证接口写入
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractRepository;

impl ContractRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Repository<VerifiedContractRow, String> for ContractRepository {
    type Row = VerifiedContractRow;

    async fn find_by_id(
        &self,
        conn: &mut DbConnection,
        address: String,
    ) -> Result<Option<VerifiedContractRow>, AppError> {
        verified_contracts::table
            .find(address)
            .select(VerifiedContractRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn save(&self, conn: &mut DbConnection, contract: &VerifiedContractRow) -> Result<(), AppError> {
        diesel::replace_into(verified_contracts::table)
            .values(contract)
            .execute(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
