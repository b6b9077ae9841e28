use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventLog {
    pub tx_hash: String,
    /// 区块内序号
    pub log_index: u32,
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_height: u64,
    pub timestamp: i64,
    pub decoded: Option<DecodedEvent>,
}

impl EventLog {
    pub fn topic(&self, i: usize) -> Option<&str> {
        self.topics.get(i).map(String::as_str)
    }
}
