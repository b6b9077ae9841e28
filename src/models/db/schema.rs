diesel::table! {
    /// 区块表
    blocks (height) {
        height -> BigInt,
        hash -> Text,
        parent_hash -> Nullable<Text>,
        timestamp -> BigInt,
        miner -> Nullable<Text>,
        difficulty -> Double,
        tx_count -> Integer,
        size -> BigInt,
        nonce -> BigInt,
        /// 1 = PoS, 0 = PoW
        is_pos -> Integer,
        /// 区块奖励（十进制字符串，单位 satoshi）
        reward -> Text,
    }
}

diesel::table! {
    /// 交易表
    transactions (hash) {
        hash -> Text,
        block_height -> BigInt,
        block_hash -> Text,
        tx_index -> Integer,
        from_address -> Nullable<Text>,
        to_address -> Nullable<Text>,
        value -> Text,
        gas_limit -> Nullable<BigInt>,
        gas_price -> Nullable<BigInt>,
        gas_used -> Nullable<BigInt>,
        input_data -> Nullable<Text>,
        /// 1 = 成功 0 = 失败
        status -> SmallInt,
        contract_address -> Nullable<Text>,
        timestamp -> BigInt,
    }
}

diesel::table! {
    /// 合约事件日志
    event_logs (id) {
        id -> BigInt,
        tx_hash -> Text,
        log_index -> Integer,
        address -> Text,
        topic0 -> Nullable<Text>,
        topic1 -> Nullable<Text>,
        topic2 -> Nullable<Text>,
        topic3 -> Nullable<Text>,
        data -> Text,
        block_height -> BigInt,
        timestamp -> BigInt,
        decoded_name -> Nullable<Text>,
        decoded_args -> Nullable<Text>,
    }
}

diesel::table! {
    tokens (address) {
        address -> Text,
        name -> Text,
        symbol -> Text,
        decimals -> Integer,
        total_supply -> Text,
    }
}

diesel::table! {
    /// 代币转账（由 Transfer 事件派生）
    token_transfers (id) {
        id -> BigInt,
        tx_hash -> Text,
        log_index -> Integer,
        token_address -> Text,
        from_address -> Text,
        to_address -> Text,
        value -> Text,
        block_height -> BigInt,
        timestamp -> BigInt,
    }
}

diesel::table! {
    token_balances (address, token_address) {
        address -> Text,
        token_address -> Text,
        balance -> Text,
        updated_at -> BigInt,
    }
}

diesel::table! {
    /// 同步游标，key = "last_block"
    sync_state (key) {
        key -> Text,
        value -> BigInt,
    }
}

diesel::table! {
    verified_contracts (address) {
        address -> Text,
        name -> Text,
        source -> Text,
        abi -> Text,
        compiler_version -> Text,
        optimization -> Integer,
        constructor_args -> Nullable<Text>,
        verified_at -> BigInt,
    }
}

diesel::joinable!(token_transfers -> tokens (token_address));

diesel::allow_tables_to_appear_in_same_query!(
    blocks,
    transactions,
    event_logs,
    tokens,
    token_transfers,
    token_balances,
    sync_state,
    verified_contracts,
);
