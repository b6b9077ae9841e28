use crate::database::{DbService, TransactionExecutor};
use crate::errors::AppError;
use crate::infrastructure::provider::ChainProvider;
use crate::models::Page;
use crate::models::db::{
    BlockRow, EventLogRow, TokenBalanceRow, TokenRow, TokenTransferRow, TransactionRow,
};
use crate::repositories::{
    BlockRepository, EventLogRepository, Repository, SyncStateRepository, TokenBalanceRepository,
    TokenRepository, TokenTransferRepository, TransactionRepository,
};
use crate::utils::{decimal_from_str, format_token_amount, normalize_address, to_i64};
use crate::log_debug;
use futures_util::FutureExt;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub latest_height: Option<u64>,
    pub block_count: i64,
    pub transaction_count: i64,
    pub contract_count: i64,
    pub token_count: i64,
    pub transfer_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncHealth {
    pub last_indexed: Option<u64>,
    pub chain_height: u64,
    /// 链高与游标之差
    pub lag: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holder {
    pub address: String,
    pub balance: String,
    /// 按代币精度格式化后的余额
    pub formatted: String,
}

/// 只读查询接口，只能看到已提交的区块
pub struct QueryService {
    db: Arc<DbService>,
    provider: Arc<dyn ChainProvider>,
}

impl QueryService {
    pub fn new(db: Arc<DbService>, provider: Arc<dyn ChainProvider>) -> Self {
        Self { db, provider }
    }

    pub async fn latest_blocks(&self, limit: i64) -> Result<Vec<BlockRow>, AppError> {
        let limit = Page::new(limit, 0).limit;
        self.db
            .with_conn(move |conn| async move { BlockRepository.latest(conn, limit).await }.boxed())
            .await
    }

    pub async fn block_by_height(&self, height: u64) -> Result<Option<BlockRow>, AppError> {
        let height = to_i64(height, "height")?;
        self.db
            .with_conn(move |conn| async move { BlockRepository.find_by_id(conn, height).await }.boxed())
            .await
    }

    pub async fn block_by_hash(&self, hash: &str) -> Result<Option<BlockRow>, AppError> {
        let hash = hash.to_string();
        self.db
            .with_conn(move |conn| async move { BlockRepository.find_by_hash(conn, &hash).await }.boxed())
            .await
    }

    pub async fn transactions_by_block(&self, height: u64) -> Result<Vec<TransactionRow>, AppError> {
        let height = to_i64(height, "height")?;
        self.db
            .with_conn(move |conn| {
                async move { TransactionRepository.find_by_block(conn, height).await }.boxed()
            })
            .await
    }

    pub async fn transaction(&self, hash: &str) -> Result<Option<TransactionRow>, AppError> {
        let hash = hash.to_string();
        self.db
            .with_conn(move |conn| async move { TransactionRepository.find_by_id(conn, hash).await }.boxed())
            .await
    }

    /// 地址会先统一为小写 0x 格式
    pub async fn transactions_by_address(
        &self,
        address: &str,
        page: Page,
    ) -> Result<Vec<TransactionRow>, AppError> {
        let address = normalize_address(address);
        self.db
            .with_conn(move |conn| {
                async move { TransactionRepository.find_by_address(conn, &address, page).await }.boxed()
            })
            .await
    }

    pub async fn logs_by_address(&self, address: &str, page: Page) -> Result<Vec<EventLogRow>, AppError> {
        let address = normalize_address(address);
        self.db
            .with_conn(move |conn| {
                async move { EventLogRepository.find_by_address(conn, &address, page).await }.boxed()
            })
            .await
    }

    pub async fn logs_by_transaction(&self, tx_hash: &str) -> Result<Vec<EventLogRow>, AppError> {
        let tx_hash = tx_hash.to_string();
        self.db
            .with_conn(move |conn| async move { EventLogRepository.find_by_tx(conn, &tx_hash).await }.boxed())
            .await
    }

    pub async fn token(&self, address: &str) -> Result<Option<TokenRow>, AppError> {
        let address = normalize_address(address);
        self.db
            .with_conn(move |conn| async move { TokenRepository.find_by_id(conn, address).await }.boxed())
            .await
    }

    pub async fn transfers_by_token(
        &self,
        token_address: &str,
        page: Page,
    ) -> Result<Vec<TokenTransferRow>, AppError> {
        let token_address = normalize_address(token_address);
        self.db
            .with_conn(move |conn| {
                async move {
                    TokenTransferRepository
                        .find_by_token(conn, &token_address, page)
                        .await
                }
                .boxed()
            })
            .await
    }

    /// 按余额倒序的持有人；代币不存在时返回 NotFound
    pub async fn top_holders(&self, token_address: &str, page: Page) -> Result<Vec<Holder>, AppError> {
        let token_address = normalize_address(token_address);
        let (token, mut rows) = self
            .db
            .with_conn(move |conn| {
                async move {
                    let token = TokenRepository.find_by_id(conn, token_address.clone()).await?;
                    let rows = TokenBalanceRepository.holders(conn, &token_address).await?;
                    Ok((token, rows))
                }
                .boxed()
            })
            .await?;
        let token = token.ok_or_else(|| AppError::NotFound("token".to_string()))?;

        rows.sort_by(|a, b| {
            decimal_from_str(&b.balance)
                .cmp(&decimal_from_str(&a.balance))
                .then_with(|| a.address.cmp(&b.address))
        });
        let decimals = u32::try_from(token.decimals)?;
        Ok(rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|row| Holder {
                formatted: format_token_amount(&row.balance, decimals),
                address: row.address,
                balance: row.balance,
            })
            .collect())
    }

    /// 地址持有的各代币余额
    pub async fn balances_of(&self, address: &str, page: Page) -> Result<Vec<TokenBalanceRow>, AppError> {
        let address = normalize_address(address);
        self.db
            .with_conn(move |conn| {
                async move { TokenBalanceRepository.find_by_address(conn, &address, page).await }.boxed()
            })
            .await
    }

    pub async fn stats(&self) -> Result<IndexStats, AppError> {
        let (latest, block_count, transaction_count, contract_count, token_count, transfer_count) = self
            .db
            .with_conn(move |conn| {
                async move {
                    Ok((
                        BlockRepository.max_height(conn).await?,
                        BlockRepository.count(conn).await?,
                        TransactionRepository.count(conn).await?,
                        TransactionRepository.count_contracts(conn).await?,
                        TokenRepository.count(conn).await?,
                        TokenTransferRepository.count(conn).await?,
                    ))
                }
                .boxed()
            })
            .await?;

        Ok(IndexStats {
            latest_height: latest.map(u64::try_from).transpose()?,
            block_count,
            transaction_count,
            contract_count,
            token_count,
            transfer_count,
        })
    }

    pub async fn last_indexed_height(&self) -> Result<Option<u64>, AppError> {
        self.db
            .with_conn(move |conn| async move { SyncStateRepository.get_cursor(conn).await }.boxed())
            .await
    }

    pub async fn health(&self) -> Result<SyncHealth, AppError> {
        let last_indexed = self.last_indexed_height().await?;
        let chain_height = self.provider.get_chain_height().await?;
        let lag = match last_indexed {
            Some(h) => chain_height.saturating_sub(h),
            None => chain_height,
        };
        Ok(SyncHealth {
            last_indexed,
            chain_height,
            lag,
        })
    }

    /// 十六进制地址转节点的 base58 展示格式，失败时原样返回十六进制
    pub async fn display_address(&self, hex_address: &str) -> String {
        let hex_address = normalize_address(hex_address);
        match self.provider.from_hex_address(&hex_address).await {
            Ok(base58) if !base58.is_empty() => base58,
            Ok(_) => hex_address,
            Err(e) => {
                log_debug!("地址 {} 转换失败，使用十六进制: {}", hex_address, e);
                hex_address
            }
        }
    }
}
