pub mod base;
pub mod block_repository;
pub mod contract_repository;
pub mod event_log_repository;
pub mod sync_state_repository;
pub mod token_balance_repository;
pub mod token_repository;
pub mod token_transfer_repository;
pub mod traits;
pub mod transaction_repository;

pub use block_repository::BlockRepository;
pub use contract_repository::ContractRepository;
pub use event_log_repository::EventLogRepository;
pub use sync_state_repository::SyncStateRepository;
pub use token_balance_repository::TokenBalanceRepository;
pub use token_repository::TokenRepository;
pub use token_transfer_repository::TokenTransferRepository;
pub use traits::repository::Repository;
pub use transaction_repository::TransactionRepository;
