use super::node_provider::ChainProvider;
use super::rpc_types::{ContractCallResult, RpcBlock, RpcReceipt};
use crate::errors::AppError;
use crate::log_warn;
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// 对任意 ChainProvider 做指数退避重试；NotFound 不重试
pub struct RetryAdapter {
    provider: Arc<dyn ChainProvider>,
    max_retries: usize,
    base_delay: Duration,
}

impl RetryAdapter {
    pub fn new(provider: Arc<dyn ChainProvider>, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            provider,
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    async fn retry_call<'a, T, Fut, F>(&'a self, method: &str, mut f: F) -> Result<T, AppError>
    where
        F: FnMut(&'a dyn ChainProvider) -> Fut + Send,
        Fut: Future<Output = Result<T, AppError>> + Send,
    {
        let mut last_error: Option<AppError> = None;
        for attempt in 0..self.max_retries {
            // 延迟逻辑：从第二次尝试 (attempt = 1) 开始执行
            if attempt > 0 {
                // 计算指数倍数，最高限制在 2^10 = 1024
                let exponent = (attempt - 1).min(10);
                let base_ms = self.base_delay.as_millis() as u64;
                let delay_ms = base_ms * (1u64 << exponent);

                // 0~10% 的随机抖动，防止多个重试在同一时间点打到节点
                let jitter = rand::thread_rng().gen_range(0..=(delay_ms / 10 + 1));
                let final_delay = Duration::from_millis(delay_ms + jitter);

                log_warn!(
                    "RPC {} 第 {} 次重试，等待 {:?}...",
                    method,
                    attempt + 1,
                    final_delay
                );
                sleep(final_delay).await;
            }
            match f(self.provider.as_ref()).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_not_found() => return Err(e),
                Err(e) => {
                    log_warn!("RPC {} 调用失败 (第 {} 次): {}", method, attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }
        Err(AppError::ProviderError(format!(
            "{} 重试 {} 次失败，最后错误: {}",
            method,
            self.max_retries,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

#[async_trait]
impl ChainProvider for RetryAdapter {
    async fn get_chain_height(&self) -> Result<u64, AppError> {
        self.retry_call("getblockcount", |p| p.get_chain_height())
            .await
    }

    async fn get_block(&self, height: u64) -> Result<Option<RpcBlock>, AppError> {
        self.retry_call("getblock", move |p| p.get_block(height))
            .await
    }

    async fn get_transaction_receipts(
        &self,
        txid: &str,
    ) -> Result<Option<Vec<RpcReceipt>>, AppError> {
        self.retry_call("gettransactionreceipt", |p| p.get_transaction_receipts(txid))
            .await
    }

    async fn get_contract_code(&self, address: &str) -> Result<Option<String>, AppError> {
        self.retry_call("getaccountinfo", |p| p.get_contract_code(address))
            .await
    }

    async fn call_contract(
        &self,
        address: &str,
        data: &str,
    ) -> Result<ContractCallResult, AppError> {
        self.retry_call("callcontract", |p| p.call_contract(address, data))
            .await
    }

    async fn get_hex_address(&self, address: &str) -> Result<String, AppError> {
        self.retry_call("gethexaddress", |p| p.get_hex_address(address))
            .await
    }

    async fn from_hex_address(&self, hex_address: &str) -> Result<String, AppError> {
        self.retry_call("fromhexaddress", |p| p.from_hex_address(hex_address))
            .await
    }
}
