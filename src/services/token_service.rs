use crate::database::{DbService, TransactionExecutor};
use crate::errors::{AppError, DecodeError};
use crate::infrastructure::parser::DecodedBlock;
use crate::infrastructure::parser::abi::{decode_abi_string, parse_uint256};
use crate::infrastructure::protocol::constants::{
    SELECTOR_DECIMALS, SELECTOR_NAME, SELECTOR_SYMBOL, SELECTOR_TOTAL_SUPPLY,
};
use crate::infrastructure::provider::ChainProvider;
use crate::models::Token;
use crate::models::db::TokenRow;
use crate::models::domain::token::{UNKNOWN_NAME, UNKNOWN_SYMBOL};
use crate::repositories::TokenRepository;
use crate::{log_debug, log_info, log_warn};
use ethers_core::types::U256;
use futures_util::FutureExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 代币发现：首次见到发出 Transfer 的合约时探测元数据。
///
/// 已知集合在服务生命周期内有效，写库成功后才登记，元数据不会刷新。
pub struct TokenService {
    provider: Arc<dyn ChainProvider>,
    db: Arc<DbService>,
    tokens: TokenRepository,
    known: Mutex<HashSet<String>>,
    probe_created_contracts: bool,
}

impl TokenService {
    pub fn new(
        provider: Arc<dyn ChainProvider>,
        db: Arc<DbService>,
        probe_created_contracts: bool,
    ) -> Self {
        Self {
            provider,
            db,
            tokens: TokenRepository::new(),
            known: Mutex::new(HashSet::new()),
            probe_created_contracts,
        }
    }

    /// 返回本区块需要新写入的代币，已入库的不再探测
    pub async fn resolve(&self, block: &DecodedBlock) -> Result<Vec<Token>, AppError> {
        let mut found = Vec::new();

        let unseen = self.unseen(&block.token_candidates).await?;
        for address in unseen {
            found.push(self.detect_token(&address).await);
        }

        if self.probe_created_contracts {
            let created: Vec<String> = block
                .created_contracts
                .iter()
                .filter(|a| !block.token_candidates.contains(a))
                .cloned()
                .collect();
            for address in self.unseen(&created).await? {
                if let Some(token) = self.probe_created(&address).await? {
                    found.push(token);
                }
            }
        }

        Ok(found)
    }

    /// 事务提交后登记
    pub fn mark_known<'a>(&self, addresses: impl IntoIterator<Item = &'a String>) -> Result<(), AppError> {
        let mut known = self.known_set()?;
        for address in addresses {
            known.insert(address.clone());
        }
        Ok(())
    }

    /// 过滤掉内存中或库中已有的地址
    async fn unseen(&self, candidates: &[String]) -> Result<Vec<String>, AppError> {
        let pending: Vec<String> = {
            let known = self.known_set()?;
            candidates
                .iter()
                .filter(|a| !known.contains(*a))
                .cloned()
                .collect()
        };
        if pending.is_empty() {
            return Ok(pending);
        }

        let tokens = self.tokens;
        let lookup = pending.clone();
        let stored: Vec<TokenRow> = self
            .db
            .with_conn(move |conn| async move { tokens.find_many(conn, &lookup).await }.boxed())
            .await?;

        let stored: HashSet<String> = stored.into_iter().map(|row| row.address).collect();
        self.mark_known(stored.iter())?;
        Ok(pending.into_iter().filter(|a| !stored.contains(a)).collect())
    }

    /// 四个探测调用各自独立失败，失败字段保留占位值
    pub async fn detect_token(&self, address: &str) -> Token {
        let mut token = Token::placeholder(address);

        match self.call_string(address, &SELECTOR_NAME).await {
            Ok(name) => token.name = name,
            Err(e) => log_debug!("代币 {} name() 调用失败: {}", address, e),
        }
        match self.call_string(address, &SELECTOR_SYMBOL).await {
            Ok(symbol) => token.symbol = symbol,
            Err(e) => log_debug!("代币 {} symbol() 调用失败: {}", address, e),
        }
        match self.call_decimals(address).await {
            Ok(decimals) => token.decimals = decimals,
            Err(e) => log_debug!("代币 {} decimals() 调用失败: {}", address, e),
        }
        match self.call_uint(address, &SELECTOR_TOTAL_SUPPLY).await {
            Ok(supply) => token.total_supply = supply,
            Err(e) => log_debug!("代币 {} totalSupply() 调用失败: {}", address, e),
        }

        log_info!(
            "发现代币 {} ({}/{}, decimals={})",
            token.address,
            token.name,
            token.symbol,
            token.decimals
        );
        token
    }

    /// 新建合约有代码且 name/symbol 至少一个可读时才视为代币
    async fn probe_created(&self, address: &str) -> Result<Option<Token>, AppError> {
        match self.provider.get_contract_code(address).await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(None),
            Err(e) => {
                log_warn!("读取合约 {} 代码失败，跳过探测: {}", address, e);
                return Ok(None);
            }
        }
        let token = self.detect_token(address).await;
        if token.name == UNKNOWN_NAME && token.symbol == UNKNOWN_SYMBOL {
            return Ok(None);
        }
        Ok(Some(token))
    }

    async fn call_output(&self, address: &str, selector: &str) -> Result<String, AppError> {
        let result = self.provider.call_contract(address, selector).await?;
        result
            .output()
            .map(str::to_string)
            .ok_or_else(|| AppError::Rpc {
                code: 0,
                message: format!(
                    "callcontract {} excepted: {}",
                    selector, result.execution_result.excepted
                ),
            })
    }

    async fn call_string(&self, address: &str, selector: &str) -> Result<String, AppError> {
        let output = self.call_output(address, selector).await?;
        let value = decode_abi_string(&output);
        if value.is_empty() {
            return Err(AppError::Decode(DecodeError::Shape(format!(
                "empty string from {}",
                selector
            ))));
        }
        Ok(value)
    }

    async fn call_uint(&self, address: &str, selector: &str) -> Result<String, AppError> {
        let output = self.call_output(address, selector).await?;
        Ok(parse_uint256(&output)?.to_string())
    }

    async fn call_decimals(&self, address: &str) -> Result<u8, AppError> {
        let output = self.call_output(address, &SELECTOR_DECIMALS).await?;
        let value = parse_uint256(&output)?;
        if value > U256::from(u8::MAX) {
            return Err(AppError::Decode(DecodeError::Overflow(
                value.to_string(),
            )));
        }
        Ok(value.as_u32() as u8)
    }

    fn known_set(&self) -> Result<std::sync::MutexGuard<'_, HashSet<String>>, AppError> {
        self.known
            .lock()
            .map_err(|_| AppError::Internal("代币缓存锁已损坏".to_string()))
    }
}
