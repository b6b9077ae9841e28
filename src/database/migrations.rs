use crate::database::DbConnection;
use crate::errors::AppError;
use diesel_async::SimpleAsyncConnection;

/// 建表语句，可重复执行
const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS blocks (
    height       BIGINT PRIMARY KEY NOT NULL,
    hash         TEXT    NOT NULL UNIQUE,
    parent_hash  TEXT,
    timestamp    BIGINT  NOT NULL,
    miner        TEXT,
    difficulty   DOUBLE  NOT NULL DEFAULT 0,
    tx_count     INTEGER NOT NULL DEFAULT 0,
    size         BIGINT  NOT NULL DEFAULT 0,
    nonce        BIGINT  NOT NULL DEFAULT 0,
    is_pos       INTEGER NOT NULL DEFAULT 0,
    reward       TEXT    NOT NULL DEFAULT '0'
);

CREATE TABLE IF NOT EXISTS transactions (
    hash             TEXT PRIMARY KEY NOT NULL,
    block_height     BIGINT  NOT NULL,
    block_hash       TEXT    NOT NULL,
    tx_index         INTEGER NOT NULL,
    from_address     TEXT,
    to_address       TEXT,
    value            TEXT    NOT NULL DEFAULT '0',
    gas_limit        BIGINT,
    gas_price        BIGINT,
    gas_used         BIGINT,
    input_data       TEXT,
    status           INTEGER NOT NULL DEFAULT 1,
    contract_address TEXT,
    timestamp        BIGINT  NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_block ON transactions (block_height, tx_index);
CREATE INDEX IF NOT EXISTS idx_transactions_from ON transactions (from_address, block_height);
CREATE INDEX IF NOT EXISTS idx_transactions_to ON transactions (to_address, block_height);
CREATE INDEX IF NOT EXISTS idx_transactions_contract ON transactions (contract_address);

CREATE TABLE IF NOT EXISTS event_logs (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    tx_hash      TEXT    NOT NULL,
    log_index    INTEGER NOT NULL,
    address      TEXT    NOT NULL,
    topic0       TEXT,
    topic1       TEXT,
    topic2       TEXT,
    topic3       TEXT,
    data         TEXT    NOT NULL DEFAULT '',
    block_height BIGINT  NOT NULL,
    timestamp    BIGINT  NOT NULL,
    decoded_name TEXT,
    decoded_args TEXT,
    UNIQUE (tx_hash, log_index)
);
CREATE INDEX IF NOT EXISTS idx_event_logs_address ON event_logs (address, block_height, log_index);

CREATE TABLE IF NOT EXISTS tokens (
    address      TEXT PRIMARY KEY NOT NULL,
    name         TEXT    NOT NULL,
    symbol       TEXT    NOT NULL,
    decimals     INTEGER NOT NULL,
    total_supply TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS token_transfers (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    tx_hash       TEXT    NOT NULL,
    log_index     INTEGER NOT NULL,
    token_address TEXT    NOT NULL REFERENCES tokens (address),
    from_address  TEXT    NOT NULL,
    to_address    TEXT    NOT NULL,
    value         TEXT    NOT NULL,
    block_height  BIGINT  NOT NULL,
    timestamp     BIGINT  NOT NULL,
    UNIQUE (tx_hash, log_index)
);
CREATE INDEX IF NOT EXISTS idx_token_transfers_token ON token_transfers (token_address, block_height, log_index);

CREATE TABLE IF NOT EXISTS token_balances (
    address       TEXT   NOT NULL,
    token_address TEXT   NOT NULL,
    balance       TEXT   NOT NULL,
    updated_at    BIGINT NOT NULL,
    PRIMARY KEY (address, token_address)
);
CREATE INDEX IF NOT EXISTS idx_token_balances_token ON token_balances (token_address);

CREATE TABLE IF NOT EXISTS sync_state (
    key   TEXT PRIMARY KEY NOT NULL,
    value BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS verified_contracts (
    address           TEXT PRIMARY KEY NOT NULL,
    name              TEXT    NOT NULL,
    source            TEXT    NOT NULL,
    abi               TEXT    NOT NULL,
    compiler_version  TEXT    NOT NULL,
    optimization      INTEGER NOT NULL DEFAULT 0,
    constructor_args  TEXT,
    verified_at       BIGINT  NOT NULL
);
"#;

pub async fn run(conn: &mut DbConnection) -> Result<(), AppError> {
    conn.batch_execute(SCHEMA).await?;
    Ok(())
}
