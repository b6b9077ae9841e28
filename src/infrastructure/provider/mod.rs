pub mod node_provider;
mod retry_adapter;
pub mod rpc_types;

pub use node_provider::{ChainProvider, QtumProvider};
pub use retry_adapter::RetryAdapter;
