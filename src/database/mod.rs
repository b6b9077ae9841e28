pub mod diesel;
pub mod migrations;

pub use self::diesel::{DbConnection, DbPool, DbService, TransactionExecutor, create_async_db_pool};
