pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_SYMBOL: &str = "???";
pub const DEFAULT_DECIMALS: u8 = 18;
pub const UNKNOWN_SUPPLY: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
}

impl Token {
    /// 元数据全部探测失败时的占位
    pub fn placeholder(address: &str) -> Self {
        Self {
            address: address.to_string(),
            name: UNKNOWN_NAME.to_string(),
            symbol: UNKNOWN_SYMBOL.to_string(),
            decimals: DEFAULT_DECIMALS,
            total_supply: UNKNOWN_SUPPLY.to_string(),
        }
    }
}
