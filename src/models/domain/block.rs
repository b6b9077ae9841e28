/// 解码后的区块头
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub parent_hash: Option<String>,
    pub timestamp: i64,
    pub miner: Option<String>,
    pub difficulty: f64,
    pub tx_count: u32,
    pub size: u64,
    pub nonce: u64,
    pub is_pos: bool,
    /// satoshi，十进制字符串
    pub reward: String,
}
