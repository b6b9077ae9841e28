pub mod balance_service;
pub mod block_service;
pub mod query_service;
pub mod token_service;

pub use balance_service::BalanceService;
pub use block_service::{BatchOutcome, BlockService, SyncState};
pub use query_service::{Holder, IndexStats, QueryService, SyncHealth};
pub use token_service::TokenService;
