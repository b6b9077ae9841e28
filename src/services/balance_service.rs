use crate::database::{DbService, TransactionExecutor};
use crate::errors::AppError;
use crate::infrastructure::protocol::constants::ZERO_ADDRESS;
use crate::{log_debug, log_info};
use crate::models::TokenBalance;
use crate::models::db::TokenTransferRow;
use crate::repositories::{TokenBalanceRepository, TokenTransferRepository};
use crate::utils::{decimal_from_str, decimal_to_integer_string};
use bigdecimal::{BigDecimal, Zero};
use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 由转账历史重算代币余额，可重复执行
pub struct BalanceService {
    db: Arc<DbService>,
    transfers: TokenTransferRepository,
    balances: TokenBalanceRepository,
}

impl BalanceService {
    pub fn new(db: Arc<DbService>) -> Self {
        Self {
            db,
            transfers: TokenTransferRepository::new(),
            balances: TokenBalanceRepository::new(),
        }
    }

    /// 单个代币在一个事务内删除并重写全部余额，返回持有人数
    pub async fn recompute_token(&self, token_address: &str) -> Result<usize, AppError> {
        let transfers = self.transfers;
        let balances = self.balances;
        let token = token_address.to_string();
        let updated_at = chrono::Utc::now().timestamp();

        let holders = self
            .db
            .execute_tx(move |conn| {
                async move {
                    let history = transfers.history_for_token(conn, &token).await?;
                    log_debug!("代币 {} 读取转账历史 {} 条", token, history.len());
                    let rows: Vec<TokenBalance> = compute_balances(&history)
                        .into_iter()
                        .map(|(address, balance)| TokenBalance {
                            address,
                            token_address: token.clone(),
                            balance: decimal_to_integer_string(&balance),
                            updated_at,
                        })
                        .collect();
                    balances.replace_for_token(conn, &token, &rows).await?;
                    Ok(rows.len())
                }
                .boxed()
            })
            .await?;

        log_info!("代币 {} 余额重算完成，持有人 {} 个", token_address, holders);
        Ok(holders)
    }

    pub async fn recompute_tokens(&self, token_addresses: &[String]) -> Result<(), AppError> {
        for token in token_addresses {
            self.recompute_token(token).await?;
        }
        Ok(())
    }
}

/// 按链上顺序累加，零地址不计余额，只保留正余额
pub fn compute_balances(history: &[TokenTransferRow]) -> BTreeMap<String, BigDecimal> {
    let mut balances: BTreeMap<String, BigDecimal> = BTreeMap::new();
    for transfer in history {
        let value = decimal_from_str(&transfer.value);
        if transfer.from_address != ZERO_ADDRESS {
            *balances
                .entry(transfer.from_address.clone())
                .or_insert_with(BigDecimal::zero) -= &value;
        }
        if transfer.to_address != ZERO_ADDRESS {
            *balances
                .entry(transfer.to_address.clone())
                .or_insert_with(BigDecimal::zero) += &value;
        }
    }
    balances.retain(|_, balance| *balance > BigDecimal::zero());
    balances
}
