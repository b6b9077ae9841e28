#![allow(dead_code)]

use async_trait::async_trait;
use qtum_indexer::config::{DatabaseConfig, SyncConfig};
use qtum_indexer::database::DbService;
use qtum_indexer::errors::AppError;
use qtum_indexer::infrastructure::protocol::constants::{
    ERC20_TRANSFER_TOPIC, SELECTOR_DECIMALS, SELECTOR_NAME, SELECTOR_SYMBOL,
    SELECTOR_TOTAL_SUPPLY,
};
use qtum_indexer::infrastructure::provider::ChainProvider;
use qtum_indexer::infrastructure::provider::rpc_types::{
    ContractCallResult, ExecutionResult, RpcBlock, RpcInput, RpcLog, RpcOutput, RpcReceipt,
    RpcScriptPubKey, RpcTransaction,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const TOKEN: &str = "f2033ede578e17fa6231047265010445bca8cf1c";
pub const ALICE: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const BOB: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const MINER: &str = "1111111111111111111111111111111111111111";

pub fn hex_addr(raw: &str) -> String {
    format!("0x{}", raw)
}

#[derive(Debug, Clone)]
pub struct FakeToken {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: u64,
}

/// 内存中的节点：按高度返回区块，可注入不存在的高度和传输错误
#[derive(Default)]
pub struct FakeProvider {
    pub chain_height: AtomicU64,
    pub blocks: Mutex<BTreeMap<u64, RpcBlock>>,
    pub receipts: Mutex<HashMap<String, Vec<RpcReceipt>>>,
    pub tokens: Mutex<HashMap<String, FakeToken>>,
    pub code: Mutex<HashSet<String>>,
    pub missing: Mutex<HashSet<u64>>,
    pub failing: Mutex<HashSet<u64>>,
    pub base58: Mutex<HashMap<String, String>>,
    pub contract_calls: AtomicUsize,
    pub block_fetches: AtomicUsize,
}

impl FakeProvider {
    pub fn new(chain_height: u64) -> Arc<Self> {
        let provider = Self::default();
        provider.chain_height.store(chain_height, Ordering::SeqCst);
        Arc::new(provider)
    }

    pub fn set_height(&self, height: u64) {
        self.chain_height.store(height, Ordering::SeqCst);
    }

    pub fn put_block(&self, block: RpcBlock) {
        self.blocks.lock().unwrap().insert(block.height, block);
    }

    pub fn put_receipts(&self, txid: &str, receipts: Vec<RpcReceipt>) {
        self.receipts.lock().unwrap().insert(txid.to_string(), receipts);
    }

    pub fn put_token(&self, address: &str, token: FakeToken) {
        self.tokens.lock().unwrap().insert(hex_addr(address), token);
    }

    pub fn mark_missing(&self, height: u64) {
        self.missing.lock().unwrap().insert(height);
    }

    pub fn fail_at(&self, height: u64) {
        self.failing.lock().unwrap().insert(height);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
        self.contract_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainProvider for FakeProvider {
    async fn get_chain_height(&self) -> Result<u64, AppError> {
        Ok(self.chain_height.load(Ordering::SeqCst))
    }

    async fn get_block(&self, height: u64) -> Result<Option<RpcBlock>, AppError> {
        self.block_fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&height) {
            return Err(AppError::ProviderError(format!("connection reset at {}", height)));
        }
        if height > self.chain_height.load(Ordering::SeqCst)
            || self.missing.lock().unwrap().contains(&height)
        {
            return Ok(None);
        }
        let stored = self.blocks.lock().unwrap().get(&height).cloned();
        Ok(Some(stored.unwrap_or_else(|| empty_block(height))))
    }

    async fn get_transaction_receipts(
        &self,
        txid: &str,
    ) -> Result<Option<Vec<RpcReceipt>>, AppError> {
        Ok(self.receipts.lock().unwrap().get(txid).cloned())
    }

    async fn get_contract_code(&self, address: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .code
            .lock()
            .unwrap()
            .contains(address)
            .then(|| "6060604052".to_string()))
    }

    async fn call_contract(
        &self,
        address: &str,
        data: &str,
    ) -> Result<ContractCallResult, AppError> {
        self.contract_calls.fetch_add(1, Ordering::SeqCst);
        let token = self.tokens.lock().unwrap().get(address).cloned();
        let Some(token) = token else {
            return Ok(call_result("Revert", ""));
        };
        let output = if data == SELECTOR_NAME.as_str() {
            abi_string(&token.name)
        } else if data == SELECTOR_SYMBOL.as_str() {
            abi_string(&token.symbol)
        } else if data == SELECTOR_DECIMALS.as_str() {
            format!("{:064x}", token.decimals)
        } else if data == SELECTOR_TOTAL_SUPPLY.as_str() {
            format!("{:064x}", token.total_supply)
        } else {
            return Ok(call_result("BadInstruction", ""));
        };
        Ok(call_result("None", &output))
    }

    async fn get_hex_address(&self, address: &str) -> Result<String, AppError> {
        self.base58
            .lock()
            .unwrap()
            .iter()
            .find(|(_, b58)| b58.as_str() == address)
            .map(|(hex, _)| hex.trim_start_matches("0x").to_string())
            .ok_or_else(|| AppError::NotFound(format!("Invalid Qtum address {}", address)))
    }

    async fn from_hex_address(&self, hex_address: &str) -> Result<String, AppError> {
        self.base58
            .lock()
            .unwrap()
            .get(hex_address)
            .cloned()
            .ok_or_else(|| AppError::Rpc {
                code: -5,
                message: "Invalid address".into(),
            })
    }
}

fn call_result(excepted: &str, output: &str) -> ContractCallResult {
    ContractCallResult {
        address: None,
        execution_result: ExecutionResult {
            excepted: excepted.to_string(),
            output: output.to_string(),
        },
    }
}

pub fn abi_string(s: &str) -> String {
    let mut out = format!("{:064x}{:064x}", 32, s.len());
    let mut payload = hex::encode(s);
    while payload.is_empty() || payload.len() % 64 != 0 {
        payload.push('0');
    }
    out.push_str(&payload);
    out
}

pub fn block_hash(height: u64) -> String {
    format!("{:064x}", height + 0xb000)
}

fn p2pkh(n: u32, value: f64, hash: &str) -> RpcOutput {
    RpcOutput {
        value,
        n,
        script_pub_key: RpcScriptPubKey {
            asm: format!("OP_DUP OP_HASH160 {} OP_EQUALVERIFY OP_CHECKSIG", hash),
            script_type: "pubkeyhash".into(),
            ..Default::default()
        },
    }
}

fn coinbase(height: u64) -> RpcTransaction {
    RpcTransaction {
        txid: format!("{:064x}", height),
        vin: vec![RpcInput {
            coinbase: Some("03".into()),
            ..Default::default()
        }],
        vout: vec![p2pkh(0, 4.0, MINER)],
    }
}

/// 只有 coinbase 的 PoW 区块
pub fn empty_block(height: u64) -> RpcBlock {
    RpcBlock {
        hash: block_hash(height),
        height,
        previous_hash: height.checked_sub(1).map(block_hash),
        time: 1_700_000_000 + height as i64 * 128,
        size: 250,
        nonce: height,
        difficulty: 1.0,
        flags: Some("proof-of-work".into()),
        tx: vec![coinbase(height)],
    }
}

pub fn pos_block(height: u64) -> RpcBlock {
    let mut block = empty_block(height);
    block.flags = Some("proof-of-stake".into());
    block.tx.push(RpcTransaction {
        txid: format!("{:064x}", height + 0xc000),
        vin: vec![RpcInput {
            txid: Some("ff".repeat(32)),
            vout: Some(0),
            value: Some(100.0),
            ..Default::default()
        }],
        vout: vec![p2pkh(0, 0.0, MINER), p2pkh(1, 101.0, MINER)],
    });
    block
}

pub fn transfer_log(token: &str, from: &str, to: &str, value: u64) -> RpcLog {
    RpcLog {
        address: token.to_string(),
        topics: vec![
            ERC20_TRANSFER_TOPIC.to_string(),
            format!("{:0>64}", from),
            format!("{:0>64}", to),
        ],
        data: format!("{:064x}", value),
    }
}

/// 在区块里追加一笔调用 token 合约的交易，回执带给定日志
pub fn add_contract_call(
    provider: &FakeProvider,
    block: &mut RpcBlock,
    sender: &str,
    token: &str,
    logs: Vec<RpcLog>,
) -> String {
    let txid = format!("{:062x}{:02x}", block.height + 0xd000, block.tx.len());
    block.tx.push(RpcTransaction {
        txid: txid.clone(),
        vin: vec![RpcInput {
            txid: Some("ee".repeat(32)),
            vout: Some(0),
            value: Some(1.0),
            ..Default::default()
        }],
        vout: vec![RpcOutput {
            value: 0.0,
            n: 0,
            script_pub_key: RpcScriptPubKey {
                asm: format!("4 250000 40 a9059cbb {} OP_CALL", token),
                script_type: "call".into(),
                ..Default::default()
            },
        }],
    });
    provider.put_receipts(
        &txid,
        vec![RpcReceipt {
            output_index: Some(0),
            from: Some(sender.to_string()),
            to: Some(token.to_string()),
            gas_used: Some(36_000),
            contract_address: Some(token.to_string()),
            excepted: Some("None".into()),
            log: logs,
        }],
    );
    txid
}

pub fn sync_config() -> SyncConfig {
    SyncConfig {
        start_height: 1,
        batch_size: 10,
        poll_interval_secs: 1,
        backoff_secs: 1,
        max_backoff_secs: 2,
        probe_created_contracts: false,
        materialize_balances: true,
        balance_interval_batches: 1,
    }
}

pub async fn open_db() -> (TempDir, Arc<DbService>) {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("index.db").to_string_lossy().into_owned(),
        max_connections: 4,
        busy_timeout_ms: 5_000,
    };
    let db = DbService::connect(&config).await.unwrap();
    (dir, Arc::new(db))
}

/// 追加一笔创建合约的交易，回执给出新合约地址
pub fn add_contract_creation(
    provider: &FakeProvider,
    block: &mut RpcBlock,
    sender: &str,
    created: &str,
) -> String {
    let txid = format!("{:062x}{:02x}", block.height + 0xe000, block.tx.len());
    block.tx.push(RpcTransaction {
        txid: txid.clone(),
        vin: vec![RpcInput {
            txid: Some("dd".repeat(32)),
            vout: Some(1),
            value: Some(10.0),
            ..Default::default()
        }],
        vout: vec![RpcOutput {
            value: 0.0,
            n: 0,
            script_pub_key: RpcScriptPubKey {
                asm: "4 2500000 40 6060604052 OP_CREATE".into(),
                script_type: "create".into(),
                ..Default::default()
            },
        }],
    });
    provider.put_receipts(
        &txid,
        vec![RpcReceipt {
            output_index: Some(0),
            from: Some(sender.to_string()),
            gas_used: Some(120_000),
            contract_address: Some(created.to_string()),
            excepted: Some("None".into()),
            ..Default::default()
        }],
    );
    provider.code.lock().unwrap().insert(hex_addr(created));
    txid
}
