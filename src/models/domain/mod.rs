pub mod balance;
pub mod block;
pub mod event_log;
pub mod token;
pub mod transaction;
pub mod transfer;

pub use balance::TokenBalance;
pub use block::Block;
pub use event_log::{DecodedEvent, EventLog};
pub use token::Token;
pub use transaction::{Transaction, TxStatus};
pub use transfer::TokenTransfer;

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset: offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(20, 0)
    }
}
