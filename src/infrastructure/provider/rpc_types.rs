//! 节点 RPC 返回结构，每个方法一个类型；节点可能省略的字段用 Option / default。

use serde::{Deserialize, Serialize};

/// getblock <hash> 2
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcBlock {
    pub hash: String,
    pub height: u64,
    #[serde(rename = "previousblockhash", default)]
    pub previous_hash: Option<String>,
    pub time: i64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub difficulty: f64,
    /// "proof-of-work" / "proof-of-stake"
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub tx: Vec<RpcTransaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcTransaction {
    pub txid: String,
    #[serde(default)]
    pub vin: Vec<RpcInput>,
    #[serde(default)]
    pub vout: Vec<RpcOutput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcInput {
    #[serde(default)]
    pub coinbase: Option<String>,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub vout: Option<u32>,
    /// 开启 addrindex 的节点会带上前序输出的地址和金额
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl RpcInput {
    pub fn is_coinbase(&self) -> bool {
        self.coinbase.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcOutput {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub n: u32,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: RpcScriptPubKey,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcScriptPubKey {
    #[serde(default)]
    pub asm: String,
    #[serde(default)]
    pub hex: String,
    #[serde(rename = "type", default)]
    pub script_type: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub addresses: Option<Vec<String>>,
}

impl RpcScriptPubKey {
    /// 新旧版本节点字段不同：address 或 addresses[0]
    pub fn display_address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .or_else(|| self.addresses.as_ref().and_then(|a| a.first().map(String::as_str)))
    }
}

/// gettransactionreceipt 数组中的一项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcReceipt {
    #[serde(rename = "outputIndex", default)]
    pub output_index: Option<u32>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: Option<u64>,
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub excepted: Option<String>,
    #[serde(alias = "logs", default)]
    pub log: Vec<RpcLog>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcLog {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

/// callcontract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractCallResult {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "executionResult", default)]
    pub execution_result: ExecutionResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub excepted: String,
    #[serde(default)]
    pub output: String,
}

impl ContractCallResult {
    /// 执行未抛异常时返回输出
    pub fn output(&self) -> Option<&str> {
        let excepted = self.execution_result.excepted.as_str();
        if excepted.is_empty() || excepted == "None" {
            Some(self.execution_result.output.as_str())
        } else {
            None
        }
    }
}

/// getaccountinfo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub code: String,
}
