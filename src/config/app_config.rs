use ::config::{ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub node: NodeConfig,
    pub sync: SyncConfig,
}

/// SQLite 存储配置（单文件）
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// 节点 RPC 配置
#[derive(Debug, Deserialize, Clone)]
pub struct NodeConfig {
    /// 多个节点用逗号分隔，按轮询方式使用
    pub rpc_urls: String,
    #[serde(default)]
    pub rpc_user: String,
    #[serde(default)]
    pub rpc_password: String,
    pub max_retries: usize,
    pub base_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// 没有游标时从该高度开始
    #[serde(default)]
    pub start_height: u64,
    pub batch_size: u64,
    pub poll_interval_secs: u64,
    pub backoff_secs: u64,
    pub max_backoff_secs: u64,
    #[serde(default = "default_true")]
    pub probe_created_contracts: bool,
    #[serde(default = "default_true")]
    pub materialize_balances: bool,
    /// 每同步多少个批次重算一次余额，期间涉及的代币累积到下次
    #[serde(default = "default_balance_interval")]
    pub balance_interval_batches: u32,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_balance_interval() -> u32 {
    1
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            start_height: 0,
            batch_size: 100,
            poll_interval_secs: 5,
            backoff_secs: 3,
            max_backoff_secs: 60,
            probe_created_contracts: true,
            materialize_balances: true,
            balance_interval_batches: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        ::config::Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
