mod app_config;

pub use app_config::{Config, DatabaseConfig, NodeConfig, SyncConfig};
