use crate::config::NodeConfig;
use crate::errors::AppError;
use crate::infrastructure::provider::rpc_types::{
    AccountInfo, ContractCallResult, RpcBlock, RpcReceipt,
};
use crate::log_info;
use crate::utils::strip_hex_prefix;
use async_trait::async_trait;
use ethers_providers::{Authorization, Http, Provider, ProviderError, RpcError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// 节点返回的"不存在"类错误码
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;
const RPC_INVALID_PARAMETER: i64 = -8;

#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn get_chain_height(&self) -> Result<u64, AppError>;

    /// 高度超出链高时返回 None
    async fn get_block(&self, height: u64) -> Result<Option<RpcBlock>, AppError>;

    /// 非合约交易没有回执，返回 None
    async fn get_transaction_receipts(
        &self,
        txid: &str,
    ) -> Result<Option<Vec<RpcReceipt>>, AppError>;

    async fn get_contract_code(&self, address: &str) -> Result<Option<String>, AppError>;

    async fn call_contract(
        &self,
        address: &str,
        data: &str,
    ) -> Result<ContractCallResult, AppError>;

    /// base58 -> hex
    async fn get_hex_address(&self, address: &str) -> Result<String, AppError>;

    /// hex -> base58
    async fn from_hex_address(&self, hex_address: &str) -> Result<String, AppError>;
}

pub struct QtumProvider {
    providers: Vec<Arc<Provider<Http>>>,
    index: AtomicUsize,
    request_timeout: Duration,
}

impl QtumProvider {
    pub fn new(config: &NodeConfig) -> Result<Self, AppError> {
        let providers = config
            .rpc_urls
            .split(',')
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(|raw| {
                let url =
                    Url::parse(raw).map_err(|e| AppError::InvalidUrl(format!("{}: {}", raw, e)))?;
                let http = if config.rpc_user.is_empty() {
                    Http::new(url)
                } else {
                    Http::new_with_auth(
                        url,
                        Authorization::basic(&config.rpc_user, &config.rpc_password),
                    )
                    .map_err(|e| AppError::InvalidUrl(format!("{}: {}", raw, e)))?
                };
                Ok(Arc::new(Provider::new(http)))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        if providers.is_empty() {
            return Err(AppError::Config("node.rpc_urls is empty".to_string()));
        }
        log_info!("成功初始化 {} 个节点 RPC Provider", providers.len());

        Ok(Self {
            providers,
            index: AtomicUsize::new(0),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        })
    }

    pub fn get_provider(&self) -> Arc<Provider<Http>> {
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        self.providers[i % self.providers.len()].clone()
    }

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, AppError>
    where
        T: Debug + Serialize + Send + Sync,
        R: Serialize + DeserializeOwned + Debug + Send,
    {
        let provider = self.get_provider();
        match timeout(self.request_timeout, provider.request::<T, R>(method, params)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(map_provider_error(method, e)),
            Err(_) => Err(AppError::ProviderError(format!(
                "{} timed out after {:?}",
                method, self.request_timeout
            ))),
        }
    }
}

/// -5/-8 视为资源不存在，其余 RPC 错误保留错误码
fn map_provider_error(method: &str, err: ProviderError) -> AppError {
    if let Some(resp) = err.as_error_response() {
        return match resp.code {
            RPC_INVALID_ADDRESS_OR_KEY | RPC_INVALID_PARAMETER => {
                AppError::NotFound(format!("{}: {}", method, resp.message))
            }
            code => AppError::Rpc {
                code,
                message: format!("{}: {}", method, resp.message),
            },
        };
    }
    AppError::ProviderError(format!("{}: {}", method, err))
}

/// NotFound 折叠为 None
fn optional<T>(result: Result<T, AppError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ChainProvider for QtumProvider {
    async fn get_chain_height(&self) -> Result<u64, AppError> {
        self.request("getblockcount", Vec::<u8>::new()).await
    }

    async fn get_block(&self, height: u64) -> Result<Option<RpcBlock>, AppError> {
        let hash: Option<String> = optional(self.request("getblockhash", [height]).await)?;
        let Some(hash) = hash else {
            return Ok(None);
        };
        optional(self.request("getblock", (hash, 2)).await)
    }

    async fn get_transaction_receipts(
        &self,
        txid: &str,
    ) -> Result<Option<Vec<RpcReceipt>>, AppError> {
        let receipts: Option<Vec<RpcReceipt>> =
            optional(self.request("gettransactionreceipt", [txid]).await)?;
        Ok(receipts.filter(|r| !r.is_empty()))
    }

    async fn get_contract_code(&self, address: &str) -> Result<Option<String>, AppError> {
        let info: Option<AccountInfo> = optional(
            self.request("getaccountinfo", [strip_hex_prefix(address)])
                .await,
        )?;
        Ok(info.map(|i| i.code).filter(|c| !c.is_empty()))
    }

    async fn call_contract(
        &self,
        address: &str,
        data: &str,
    ) -> Result<ContractCallResult, AppError> {
        self.request(
            "callcontract",
            (strip_hex_prefix(address), strip_hex_prefix(data)),
        )
        .await
    }

    async fn get_hex_address(&self, address: &str) -> Result<String, AppError> {
        self.request("gethexaddress", [address]).await
    }

    async fn from_hex_address(&self, hex_address: &str) -> Result<String, AppError> {
        self.request("fromhexaddress", [strip_hex_prefix(hex_address)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_config(urls: &str) -> NodeConfig {
        NodeConfig {
            rpc_urls: urls.to_string(),
            rpc_user: "qtum".to_string(),
            rpc_password: "secret".to_string(),
            max_retries: 3,
            base_delay_ms: 10,
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn rotates_between_endpoints() {
        let provider =
            QtumProvider::new(&node_config("http://127.0.0.1:3889, http://127.0.0.1:13889"))
                .unwrap();
        let a = provider.get_provider();
        let b = provider.get_provider();
        let c = provider.get_provider();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn rejects_empty_and_invalid_urls() {
        assert!(matches!(
            QtumProvider::new(&node_config(" , ")),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            QtumProvider::new(&node_config("not a url")),
            Err(AppError::InvalidUrl(_))
        ));
    }

    #[test]
    fn not_found_folds_to_none() {
        let missing: Result<u64, AppError> = Err(AppError::NotFound("x".into()));
        assert_eq!(optional(missing).unwrap(), None);
        let failed: Result<u64, AppError> = Err(AppError::ProviderError("down".into()));
        assert!(optional(failed).is_err());
    }
}
