#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failed,
}

impl TxStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            TxStatus::Success => 1,
            TxStatus::Failed => 0,
        }
    }

    /// 节点回执中 excepted == "None" 表示执行成功
    pub fn from_excepted(excepted: Option<&str>) -> Self {
        match excepted {
            None | Some("None") | Some("") => TxStatus::Success,
            Some(_) => TxStatus::Failed,
        }
    }
}

/// 从 UTXO 输出投影出的交易视图。
///
/// from/to/value 只是近似值：取第一个输出作为金额和接收方，
/// 合约调用/创建由脚本类型识别。
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub block_height: u64,
    pub block_hash: String,
    pub tx_index: u32,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub value: String,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u64>,
    pub gas_used: Option<u64>,
    pub input_data: Option<String>,
    pub status: TxStatus,
    pub contract_address: Option<String>,
    pub timestamp: i64,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        self.to_address.is_none() && self.contract_address.is_some()
    }
}
