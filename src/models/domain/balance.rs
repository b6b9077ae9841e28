#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub address: String,
    pub token_address: String,
    pub balance: String,
    pub updated_at: i64,
}
