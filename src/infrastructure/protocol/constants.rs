use ethers_core::utils::keccak256;
use once_cell::sync::Lazy;

pub const TRANSFER_EVENT_SIGNATURE: &str = "Transfer(address,address,uint256)";

/// keccak256("Transfer(address,address,uint256)")，不带 0x 的小写十六进制
pub static ERC20_TRANSFER_TOPIC: Lazy<String> =
    Lazy::new(|| hex::encode(keccak256(TRANSFER_EVENT_SIGNATURE)));

pub static SELECTOR_NAME: Lazy<String> = Lazy::new(|| selector("name()"));
pub static SELECTOR_SYMBOL: Lazy<String> = Lazy::new(|| selector("symbol()"));
pub static SELECTOR_DECIMALS: Lazy<String> = Lazy::new(|| selector("decimals()"));
pub static SELECTOR_TOTAL_SUPPLY: Lazy<String> = Lazy::new(|| selector("totalSupply()"));

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// getblock 返回的 flags 中 PoS 区块的标记
pub const PROOF_OF_STAKE_FLAG: &str = "proof-of-stake";

/// 输出脚本类型
pub const SCRIPT_TYPE_CREATE: &str = "create";
pub const SCRIPT_TYPE_CALL: &str = "call";
pub const SCRIPT_TYPE_CREATE_SENDER: &str = "create_sender";
pub const SCRIPT_TYPE_CALL_SENDER: &str = "call_sender";
pub const SCRIPT_TYPE_PUBKEYHASH: &str = "pubkeyhash";

pub const CURSOR_KEY: &str = "last_block";

/// 4 字节函数选择器（十六进制）
fn selector(signature: &str) -> String {
    hex::encode(&keccak256(signature)[..4])
}
