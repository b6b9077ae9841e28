#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub tx_hash: String,
    pub log_index: u32,
    pub token_address: String,
    pub from_address: String,
    pub to_address: String,
    /// 十进制字符串
    pub value: String,
    pub block_height: u64,
    pub timestamp: i64,
}
