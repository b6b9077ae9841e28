pub mod balance_db;
pub mod block_db;
pub mod contract_db;
pub mod event_log_db;
pub mod schema;
pub mod token_db;
pub mod transaction_db;
pub mod transfer_db;

pub use balance_db::TokenBalanceRow;
pub use block_db::BlockRow;
pub use contract_db::VerifiedContractRow;
pub use event_log_db::{EventLogInsert, EventLogRow};
pub use token_db::TokenRow;
pub use transaction_db::TransactionRow;
pub use transfer_db::{TokenTransferInsert, TokenTransferRow};
